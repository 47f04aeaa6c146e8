//! Binding conforming dynamic values to typed destinations.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::num::FpCategory;

use super::{ConversionTarget, DynamicValue, Number, PathStep, render_path};

/// A value conforming to one of the supported [`ConversionTarget`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// A string.
    String(String),
    /// A whole number.
    Integer(i64),
    /// A list of strings.
    StringList(Vec<String>),
    /// A list of whole numbers.
    IntegerList(Vec<i64>),
    /// A map of strings.
    StringMap(BTreeMap<String, String>),
    /// A map of whole numbers.
    IntegerMap(BTreeMap<String, i64>),
}

impl TypedValue {
    /// Returns the target this value was decoded for.
    #[must_use]
    pub const fn target(&self) -> ConversionTarget {
        match self {
            Self::String(_) => ConversionTarget::String,
            Self::Integer(_) => ConversionTarget::Integer,
            Self::StringList(_) => ConversionTarget::StringList,
            Self::IntegerList(_) => ConversionTarget::IntegerList,
            Self::StringMap(_) => ConversionTarget::StringMap,
            Self::IntegerMap(_) => ConversionTarget::IntegerMap,
        }
    }
}

/// A value could not be bound to the requested destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    path: String,
    message: String,
}

impl DecodeError {
    fn at(path: &[PathStep], message: impl Into<String>) -> Self {
        Self {
            path: render_path(path),
            message: message.into(),
        }
    }

    /// Location of the offending element, empty at the top level.
    #[must_use]
    pub const fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Description of the failure.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes `value` into `target`.
///
/// Null and unknown values are rejected at any depth, as are numbers with a
/// fractional part when a whole number is required.
///
/// # Errors
///
/// Returns a [`DecodeError`] naming the first offending element.
///
/// # Example
///
/// ```
/// use lintwire_plugin::value::{ConversionTarget, DynamicValue, TypedValue, decode};
///
/// let typed = decode(DynamicValue::from(3_i64), ConversionTarget::Integer).expect("whole number");
/// assert_eq!(typed, TypedValue::Integer(3));
/// ```
pub fn decode(value: DynamicValue, target: ConversionTarget) -> Result<TypedValue, DecodeError> {
    let mut path = Vec::new();
    match target {
        ConversionTarget::String => decode_string(value, &path).map(TypedValue::String),
        ConversionTarget::Integer => decode_integer(value, &path).map(TypedValue::Integer),
        ConversionTarget::StringList => {
            decode_list(value, &mut path, decode_string).map(TypedValue::StringList)
        }
        ConversionTarget::IntegerList => {
            decode_list(value, &mut path, decode_integer).map(TypedValue::IntegerList)
        }
        ConversionTarget::StringMap => {
            decode_map(value, &mut path, decode_string).map(TypedValue::StringMap)
        }
        ConversionTarget::IntegerMap => {
            decode_map(value, &mut path, decode_integer).map(TypedValue::IntegerMap)
        }
    }
}

fn reject_absent(value: &DynamicValue, path: &[PathStep]) -> Result<(), DecodeError> {
    match value {
        DynamicValue::Null => Err(DecodeError::at(path, "value must not be null")),
        DynamicValue::Unknown => Err(DecodeError::at(path, "value must be known")),
        _ => Ok(()),
    }
}

fn decode_string(value: DynamicValue, path: &[PathStep]) -> Result<String, DecodeError> {
    reject_absent(&value, path)?;
    match value {
        DynamicValue::String(text) => Ok(text),
        other => Err(DecodeError::at(
            path,
            format!("string required, found {}", other.kind()),
        )),
    }
}

fn decode_integer(value: DynamicValue, path: &[PathStep]) -> Result<i64, DecodeError> {
    reject_absent(&value, path)?;
    match value {
        DynamicValue::Number(number) => whole_number(&number, path),
        other => Err(DecodeError::at(
            path,
            format!("number required, found {}", other.kind()),
        )),
    }
}

fn whole_number(number: &Number, path: &[PathStep]) -> Result<i64, DecodeError> {
    if let Some(integer) = number.as_i64() {
        return Ok(integer);
    }
    if number.is_u64() {
        return Err(DecodeError::at(path, format!("{number} is out of range")));
    }
    let Some(float) = number.as_f64() else {
        return Err(DecodeError::at(path, format!("{number} is not representable")));
    };
    if float.fract().classify() != FpCategory::Zero {
        return Err(DecodeError::at(
            path,
            format!("value must be a whole number, found {number}"),
        ));
    }
    format!("{float:.0}")
        .parse::<i64>()
        .map_err(|_| DecodeError::at(path, format!("{number} is out of range")))
}

fn decode_list<T>(
    value: DynamicValue,
    path: &mut Vec<PathStep>,
    element: fn(DynamicValue, &[PathStep]) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    reject_absent(&value, path)?;
    let DynamicValue::List(items) = value else {
        return Err(DecodeError::at(
            path,
            format!("list required, found {}", value.kind()),
        ));
    };
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        path.push(PathStep::Index(index));
        let result = element(item, path);
        path.pop();
        decoded.push(result?);
    }
    Ok(decoded)
}

fn decode_map<T>(
    value: DynamicValue,
    path: &mut Vec<PathStep>,
    element: fn(DynamicValue, &[PathStep]) -> Result<T, DecodeError>,
) -> Result<BTreeMap<String, T>, DecodeError> {
    reject_absent(&value, path)?;
    let DynamicValue::Map(entries) = value else {
        return Err(DecodeError::at(
            path,
            format!("map required, found {}", value.kind()),
        ));
    };
    let mut decoded = BTreeMap::new();
    for (key, item) in entries {
        path.push(PathStep::Key(key.clone()));
        let result = element(item, path);
        path.pop();
        decoded.insert(key, result?);
    }
    Ok(decoded)
}

mod sealed {
    pub trait Sealed {}
}

/// Rust types an evaluated expression can be decoded into.
///
/// The set is closed: strings, 64- and 32-bit integers, and lists and
/// string-keyed maps of either.
pub trait Destination: sealed::Sealed + Sized {
    /// Target the dynamic value is decoded for.
    const TARGET: ConversionTarget;

    /// Narrows a decoded value to this type.
    ///
    /// # Errors
    ///
    /// Fails when `value` was decoded for another target or does not fit
    /// this type's range.
    fn from_typed(value: TypedValue) -> Result<Self, DecodeError>;
}

fn wrong_target(expected: ConversionTarget, value: &TypedValue) -> DecodeError {
    DecodeError::at(
        &[],
        format!("{expected} required, found {}", value.target()),
    )
}

macro_rules! destination {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}

        impl Destination for $ty {
            const TARGET: ConversionTarget = ConversionTarget::$variant;

            fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
                match value {
                    TypedValue::$variant(inner) => Ok(inner),
                    other => Err(wrong_target(Self::TARGET, &other)),
                }
            }
        }
    };
}

impl sealed::Sealed for String {}

impl Destination for String {
    const TARGET: ConversionTarget = ConversionTarget::String;

    fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
        match value {
            TypedValue::String(text) => Ok(text),
            other => Err(wrong_target(Self::TARGET, &other)),
        }
    }
}

impl sealed::Sealed for i64 {}

impl Destination for i64 {
    const TARGET: ConversionTarget = ConversionTarget::Integer;

    fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
        match value {
            TypedValue::Integer(integer) => Ok(integer),
            other => Err(wrong_target(Self::TARGET, &other)),
        }
    }
}

impl sealed::Sealed for i32 {}

impl Destination for i32 {
    const TARGET: ConversionTarget = ConversionTarget::Integer;

    fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
        match value {
            TypedValue::Integer(integer) => Self::try_from(integer).map_err(|_| {
                DecodeError::at(&[], format!("{integer} is out of range for a 32-bit integer"))
            }),
            other => Err(wrong_target(Self::TARGET, &other)),
        }
    }
}

destination!(Vec<String>, StringList);
destination!(Vec<i64>, IntegerList);
destination!(BTreeMap<String, String>, StringMap);
destination!(BTreeMap<String, i64>, IntegerMap);

impl<S: BuildHasher + Default> sealed::Sealed for HashMap<String, String, S> {}

impl<S: BuildHasher + Default> Destination for HashMap<String, String, S> {
    const TARGET: ConversionTarget = ConversionTarget::StringMap;

    fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
        match value {
            TypedValue::StringMap(entries) => Ok(entries.into_iter().collect()),
            other => Err(wrong_target(Self::TARGET, &other)),
        }
    }
}

impl<S: BuildHasher + Default> sealed::Sealed for HashMap<String, i64, S> {}

impl<S: BuildHasher + Default> Destination for HashMap<String, i64, S> {
    const TARGET: ConversionTarget = ConversionTarget::IntegerMap;

    fn from_typed(value: TypedValue) -> Result<Self, DecodeError> {
        match value {
            TypedValue::IntegerMap(entries) => Ok(entries.into_iter().collect()),
            other => Err(wrong_target(Self::TARGET, &other)),
        }
    }
}
