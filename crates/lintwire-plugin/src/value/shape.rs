//! Dynamic type descriptors and the closed set of decode targets.

use std::fmt;

use thiserror::Error;

/// The dynamic type a value is coerced to before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// A string.
    String,
    /// A number.
    Number,
    /// A boolean.
    Bool,
    /// A list whose elements all have the given shape.
    List(Box<TypeShape>),
    /// A string-keyed map whose values all have the given shape.
    Map(Box<TypeShape>),
}

impl TypeShape {
    /// Shorthand for `List(element)`.
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Shorthand for `Map(element)`.
    #[must_use]
    pub fn map(element: Self) -> Self {
        Self::Map(Box::new(element))
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Bool => f.write_str("bool"),
            Self::List(element) => write!(f, "list of {element}"),
            Self::Map(element) => write!(f, "map of {element}"),
        }
    }
}

/// Destination shapes an evaluated expression can be decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionTarget {
    /// `string`
    String,
    /// `number`, decoded as a whole number.
    Integer,
    /// `list of string`
    StringList,
    /// `list of number`, decoded as whole numbers.
    IntegerList,
    /// `map of string`
    StringMap,
    /// `map of number`, decoded as whole numbers.
    IntegerMap,
}

impl ConversionTarget {
    /// Returns the dynamic shape the value must conform to first.
    #[must_use]
    pub fn shape(self) -> TypeShape {
        match self {
            Self::String => TypeShape::String,
            Self::Integer => TypeShape::Number,
            Self::StringList => TypeShape::list(TypeShape::String),
            Self::IntegerList => TypeShape::list(TypeShape::Number),
            Self::StringMap => TypeShape::map(TypeShape::String),
            Self::IntegerMap => TypeShape::map(TypeShape::Number),
        }
    }

    /// Resolves a dynamic shape to a supported target.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedTarget`] for any shape outside the supported set,
    /// such as `bool` or nested collections.
    pub fn from_shape(shape: &TypeShape) -> Result<Self, UnsupportedTarget> {
        match shape {
            TypeShape::String => Ok(Self::String),
            TypeShape::Number => Ok(Self::Integer),
            TypeShape::List(element) => match element.as_ref() {
                TypeShape::String => Ok(Self::StringList),
                TypeShape::Number => Ok(Self::IntegerList),
                _ => Err(UnsupportedTarget(shape.clone())),
            },
            TypeShape::Map(element) => match element.as_ref() {
                TypeShape::String => Ok(Self::StringMap),
                TypeShape::Number => Ok(Self::IntegerMap),
                _ => Err(UnsupportedTarget(shape.clone())),
            },
            TypeShape::Bool => Err(UnsupportedTarget(shape.clone())),
        }
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.shape().fmt(f)
    }
}

/// A destination shape outside the supported set was requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported conversion target: {0}")]
pub struct UnsupportedTarget(pub TypeShape);
