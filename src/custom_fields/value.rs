//! Polymorphic field values keyed by declared data type and multiplicity.

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use super::DataType;
use crate::resource::Reference;

/// A value whose JSON shape did not match its declared discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error(
        "expected {expected} for datatype {data_type} (multi_value={multi_value}), found {found}"
    )]
    Mismatch {
        data_type: DataType,
        multi_value: bool,
        expected: &'static str,
        found: Box<str>,
    },
    #[error("datatype {data_type} does not support multi_value={multi_value}")]
    Unsupported {
        data_type: DataType,
        multi_value: bool,
    },
}

/// Typed value of a custom field.
///
/// Each arm is one legal (data type, multiplicity) pair. Textual data types
/// (`string`, `datetime`, `url`) share the string arms.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Strings(Vec<String>),
    Integer(i64),
    Integers(Vec<i64>),
    Float(f64),
    Floats(Vec<f64>),
    Boolean(bool),
    Booleans(Vec<bool>),
    FieldOption(Reference),
}

fn expected_shape(data_type: DataType, multi_value: bool) -> Option<&'static str> {
    let shape = match (data_type, multi_value) {
        (t, false) if t.is_textual() => "a string",
        (t, true) if t.is_textual() => "an array of strings",
        (DataType::Integer, false) => "an integer",
        (DataType::Integer, true) => "an array of integers",
        (DataType::Float, false) => "a number",
        (DataType::Float, true) => "an array of numbers",
        (DataType::Boolean, false) => "a boolean",
        (DataType::Boolean, true) => "an array of booleans",
        (DataType::FieldOption, false) => "an object with id and type",
        _ => return None,
    };
    Some(shape)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a fractional number",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    reason = "only whole numbers inside the i64 range are converted"
)]
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    let in_range = f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

fn as_reference(value: &Value) -> Option<Reference> {
    let obj = value.as_object()?;
    obj.get("id")?.as_str()?;
    obj.get("type")?.as_str()?;
    Reference::deserialize(value).ok()
}

impl FieldValue {
    /// Decode `raw` according to the declared discriminators.
    ///
    /// Scalars are never wrapped into single-element arrays and strings are
    /// never parsed as numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] when the JSON shape disagrees with the
    /// declared pair, or the pair itself is not legal.
    pub fn decode(data_type: DataType, multi_value: bool, raw: &Value) -> Result<Self, ShapeError> {
        let Some(expected) = expected_shape(data_type, multi_value) else {
            return Err(ShapeError::Unsupported {
                data_type,
                multi_value,
            });
        };
        let mismatch = |found: String| ShapeError::Mismatch {
            data_type,
            multi_value,
            expected,
            found: found.into_boxed_str(),
        };
        if multi_value {
            let Value::Array(items) = raw else {
                return Err(mismatch(describe(raw).to_string()));
            };
            let element = |found: &Value| mismatch(format!("an array containing {}", describe(found)));
            return match data_type {
                DataType::Integer => collect(items, as_integer, element).map(Self::Integers),
                DataType::Float => collect(items, as_float, element).map(Self::Floats),
                DataType::Boolean => collect(items, Value::as_bool, element).map(Self::Booleans),
                _ => collect(items, as_string, element).map(Self::Strings),
            };
        }
        let scalar = match data_type {
            DataType::Integer => as_integer(raw).map(Self::Integer),
            DataType::Float => as_float(raw).map(Self::Float),
            DataType::Boolean => raw.as_bool().map(Self::Boolean),
            DataType::FieldOption => as_reference(raw).map(Self::FieldOption),
            _ => as_string(raw).map(Self::String),
        };
        scalar.ok_or_else(|| mismatch(describe(raw).to_string()))
    }

    /// Encode this value for the declared discriminators.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] when the value's arm does not match the
    /// declared pair, or a float is not finite.
    pub fn encode_as(&self, data_type: DataType, multi_value: bool) -> Result<Value, ShapeError> {
        let Some(expected) = expected_shape(data_type, multi_value) else {
            return Err(ShapeError::Unsupported {
                data_type,
                multi_value,
            });
        };
        let compatible = match self {
            Self::String(_) => data_type.is_textual() && !multi_value,
            Self::Strings(_) => data_type.is_textual() && multi_value,
            Self::Integer(_) => data_type == DataType::Integer && !multi_value,
            Self::Integers(_) => data_type == DataType::Integer && multi_value,
            Self::Float(_) => data_type == DataType::Float && !multi_value,
            Self::Floats(_) => data_type == DataType::Float && multi_value,
            Self::Boolean(_) => data_type == DataType::Boolean && !multi_value,
            Self::Booleans(_) => data_type == DataType::Boolean && multi_value,
            Self::FieldOption(_) => data_type == DataType::FieldOption && !multi_value,
        };
        let mismatch = |found: &str| ShapeError::Mismatch {
            data_type,
            multi_value,
            expected,
            found: found.into(),
        };
        if !compatible {
            return Err(mismatch(self.shape_name()));
        }
        let float = |f: f64| {
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| mismatch("a non-finite number"))
        };
        Ok(match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Strings(v) => Value::from(v.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Integers(v) => Value::from(v.clone()),
            Self::Float(f) => float(*f)?,
            Self::Floats(v) => Value::Array(v.iter().map(|f| float(*f)).collect::<Result<_, _>>()?),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Booleans(v) => Value::from(v.clone()),
            Self::FieldOption(r) => {
                serde_json::to_value(r).map_err(|_| mismatch("an unencodable reference"))?
            }
        })
    }

    /// Whether this arm holds several values.
    #[must_use]
    pub const fn is_multi_value(&self) -> bool {
        matches!(
            self,
            Self::Strings(_) | Self::Integers(_) | Self::Floats(_) | Self::Booleans(_)
        )
    }

    fn shape_name(&self) -> &'static str {
        match self {
            Self::String(_) => "a string",
            Self::Strings(_) => "an array of strings",
            Self::Integer(_) => "an integer",
            Self::Integers(_) => "an array of integers",
            Self::Float(_) => "a number",
            Self::Floats(_) => "an array of numbers",
            Self::Boolean(_) => "a boolean",
            Self::Booleans(_) => "an array of booleans",
            Self::FieldOption(_) => "a field option reference",
        }
    }
}

fn collect<T>(
    items: &[Value],
    convert: impl Fn(&Value) -> Option<T>,
    err: impl Fn(&Value) -> ShapeError,
) -> Result<Vec<T>, ShapeError> {
    items
        .iter()
        .map(|item| convert(item).ok_or_else(|| err(item)))
        .collect()
}

/// A value together with the discriminators that describe its shape.
///
/// Wire form: `{"datatype": "...", "multi_value": bool, "value": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    data_type: DataType,
    multi_value: bool,
    value: FieldValue,
}

impl DefaultValue {
    /// Pair `value` with its discriminators.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] when `value` cannot be encoded as declared.
    pub fn new(
        data_type: DataType,
        multi_value: bool,
        value: FieldValue,
    ) -> Result<Self, ShapeError> {
        value.encode_as(data_type, multi_value)?;
        Ok(Self {
            data_type,
            multi_value,
            value,
        })
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub const fn multi_value(&self) -> bool {
        self.multi_value
    }

    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> FieldValue {
        self.value
    }
}

#[derive(Serialize, Deserialize)]
struct RawDefaultValue {
    datatype: DataType,
    #[serde(default)]
    multi_value: bool,
    value: Value,
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .value
            .encode_as(self.data_type, self.multi_value)
            .map_err(ser::Error::custom)?;
        RawDefaultValue {
            datatype: self.data_type,
            multi_value: self.multi_value,
            value,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDefaultValue::deserialize(deserializer)?;
        let value =
            FieldValue::decode(raw.datatype, raw.multi_value, &raw.value).map_err(de::Error::custom)?;
        Ok(Self {
            data_type: raw.datatype,
            multi_value: raw.multi_value,
            value,
        })
    }
}

/// Payload of a fixed field option: a single value and its data type.
///
/// Decodes from either `data_type` or `datatype`; encodes as `data_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionData {
    pub data_type: DataType,
    pub value: FieldValue,
}

#[derive(Serialize, Deserialize)]
struct RawOptionData {
    #[serde(alias = "datatype")]
    data_type: DataType,
    value: Value,
}

impl Serialize for OptionData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .value
            .encode_as(self.data_type, false)
            .map_err(ser::Error::custom)?;
        RawOptionData {
            data_type: self.data_type,
            value,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OptionData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawOptionData::deserialize(deserializer)?;
        let value = FieldValue::decode(raw.data_type, false, &raw.value).map_err(de::Error::custom)?;
        Ok(Self {
            data_type: raw.data_type,
            value,
        })
    }
}
