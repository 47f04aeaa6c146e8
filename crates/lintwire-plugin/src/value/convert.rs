//! Type-level coercion of dynamic values.
//!
//! | value \ shape | string | number | bool | list(e) | map(e) |
//! |---|---|---|---|---|---|
//! | null, unknown | kept | kept | kept | kept | kept |
//! | string | kept | parsed | `"true"`/`"false"` | - | - |
//! | number | decimal text | kept | - | - | - |
//! | bool | `"true"`/`"false"` | - | kept | - | - |
//! | list | - | - | - | each element to `e` | - |
//! | map | - | - | - | - | each value to `e` |
//!
//! Every `-` cell is a [`ConversionError`]. Null and unknown survive
//! conversion unchanged; whether they are acceptable is decided at decode.

use std::collections::BTreeMap;
use std::fmt;
use std::num::FpCategory;

use super::{DynamicValue, Number, PathStep, TypeShape, render_path};

/// A value could not be coerced to the requested shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    path: String,
    message: String,
}

impl ConversionError {
    fn at(path: &[PathStep], message: impl Into<String>) -> Self {
        Self {
            path: render_path(path),
            message: message.into(),
        }
    }

    fn required(path: &[PathStep], shape: &TypeShape, found: &DynamicValue) -> Self {
        Self::at(path, format!("{shape} required, found {}", found.kind()))
    }

    /// Location of the offending element, empty at the top level.
    #[must_use]
    pub const fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Description of the mismatch.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ConversionError {}

/// Coerces `value` to `shape`.
///
/// # Errors
///
/// Returns a [`ConversionError`] naming the first element, in value order,
/// that cannot be coerced.
///
/// # Example
///
/// ```
/// use lintwire_plugin::value::{DynamicValue, TypeShape, convert};
///
/// let converted = convert(DynamicValue::from("42"), &TypeShape::Number).expect("numeric");
/// assert_eq!(converted, DynamicValue::from(42_i64));
/// ```
pub fn convert(value: DynamicValue, shape: &TypeShape) -> Result<DynamicValue, ConversionError> {
    convert_at(value, shape, &mut Vec::new())
}

fn convert_at(
    value: DynamicValue,
    shape: &TypeShape,
    path: &mut Vec<PathStep>,
) -> Result<DynamicValue, ConversionError> {
    match (value, shape) {
        (kept @ (DynamicValue::Null | DynamicValue::Unknown), _)
        | (kept @ DynamicValue::String(_), TypeShape::String)
        | (kept @ DynamicValue::Number(_), TypeShape::Number)
        | (kept @ DynamicValue::Bool(_), TypeShape::Bool) => Ok(kept),
        (DynamicValue::Number(number), TypeShape::String) => {
            Ok(DynamicValue::String(render_number(&number)))
        }
        (DynamicValue::Bool(flag), TypeShape::String) => Ok(DynamicValue::String(flag.to_string())),
        (DynamicValue::String(text), TypeShape::Number) => parse_number(&text)
            .map(DynamicValue::Number)
            .ok_or_else(|| ConversionError::at(path, format!("a number is required, found {text:?}"))),
        (DynamicValue::String(text), TypeShape::Bool) => match text.as_str() {
            "true" => Ok(DynamicValue::Bool(true)),
            "false" => Ok(DynamicValue::Bool(false)),
            _ => Err(ConversionError::at(
                path,
                format!("a bool is required, found {text:?}"),
            )),
        },
        (DynamicValue::List(items), TypeShape::List(element)) => {
            convert_list(items, element, path).map(DynamicValue::List)
        }
        (DynamicValue::Map(entries), TypeShape::Map(element)) => {
            convert_map(entries, element, path).map(DynamicValue::Map)
        }
        (found, wanted) => Err(ConversionError::required(path, wanted, &found)),
    }
}

fn convert_list(
    items: Vec<DynamicValue>,
    element: &TypeShape,
    path: &mut Vec<PathStep>,
) -> Result<Vec<DynamicValue>, ConversionError> {
    let mut converted = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        path.push(PathStep::Index(index));
        let result = convert_at(item, element, path);
        path.pop();
        converted.push(result?);
    }
    Ok(converted)
}

fn convert_map(
    entries: BTreeMap<String, DynamicValue>,
    element: &TypeShape,
    path: &mut Vec<PathStep>,
) -> Result<BTreeMap<String, DynamicValue>, ConversionError> {
    let mut converted = BTreeMap::new();
    for (key, item) in entries {
        path.push(PathStep::Key(key.clone()));
        let result = convert_at(item, element, path);
        path.pop();
        converted.insert(key, result?);
    }
    Ok(converted)
}

/// Renders a number as decimal text. Whole floats drop the trailing `.0`.
fn render_number(number: &Number) -> String {
    match number.as_f64() {
        Some(float)
            if number.is_f64()
                && float.is_finite()
                && float.fract().classify() == FpCategory::Zero =>
        {
            format!("{float:.0}")
        }
        _ => number.to_string(),
    }
}

fn parse_number(text: &str) -> Option<Number> {
    text.parse::<Number>().ok()
}
