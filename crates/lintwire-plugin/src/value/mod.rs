//! Dynamic values returned by the host and their typed decoding.
//!
//! Evaluating an expression yields a self-describing [`DynamicValue`]. Turning
//! it into Rust data takes two steps:
//!
//! 1. [`convert`] coerces the value to a [`TypeShape`] using a closed table of
//!    permitted conversions (numbers and booleans render as strings, numeric
//!    strings parse as numbers, collections convert element-wise).
//! 2. [`decode`] binds the conforming value to one of the supported
//!    [`ConversionTarget`]s, rejecting null, unknown, and non-integral values.
//!
//! The two steps fail with distinct errors so callers can tell a type-level
//! mismatch from a decoding failure.

mod convert;
mod decode;
mod shape;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use self::convert::{ConversionError, convert};
pub use self::decode::{DecodeError, Destination, TypedValue, decode};
pub use self::shape::{ConversionTarget, TypeShape, UnsupportedTarget};

/// Numeric payload of a dynamic value.
pub use serde_json::Number;

/// A value produced by the host's evaluator.
///
/// # Example
///
/// ```
/// use lintwire_plugin::value::DynamicValue;
///
/// let value: DynamicValue = serde_json::from_str(r#"{"type":"string","value":"t2.micro"}"#)
///     .expect("valid payload");
/// assert_eq!(value, DynamicValue::from("t2.micro"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DynamicValue {
    /// An explicit null.
    Null,
    /// A value not known until the host applies the configuration.
    Unknown,
    /// A string.
    String(String),
    /// A number.
    Number(Number),
    /// A boolean.
    Bool(bool),
    /// An ordered sequence.
    List(Vec<DynamicValue>),
    /// A string-keyed mapping.
    Map(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    /// Short name of the value's runtime kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Renders a path through nested collections, e.g. `[2]["name"]`.
pub(crate) fn render_path(path: &[PathStep]) -> String {
    path.iter().map(ToString::to_string).collect()
}

/// One step into a nested collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathStep {
    Index(usize),
    Key(String),
}

impl std::fmt::Display for PathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}
