//! Custom field types and the polymorphic value codecs they depend on.
//!
//! PagerDuty describes the shape of a field's value with sibling
//! discriminators: a declared data type plus either a `multi_value` flag or
//! a `field_type`. [`FieldValue`] is the typed sum of every legal shape and
//! [`DefaultValue`] carries a value together with its discriminators.

mod fields;
mod value;


use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

pub use self::fields::{CustomField, FieldConfiguration, FieldOption, IncidentCustomField};
pub use self::value::{DefaultValue, FieldValue, OptionData, ShapeError};

/// Declared data type of a custom field.
///
/// Unrecognised strings decode to [`DataType::Unknown`] so newer API
/// revisions do not break decoding; non-string JSON is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    Unknown,
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Url,
    FieldOption,
}

impl DataType {
    pub const ALL: [Self; 8] = [
        Self::Unknown,
        Self::String,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Datetime,
        Self::Url,
        Self::FieldOption,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Url => "url",
            Self::FieldOption => "field_option",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Whether values of this type travel as JSON strings.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::Datetime | Self::Url)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many values a field holds and whether they come from fixed options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    Unknown,
    SingleValue,
    SingleValueFixed,
    MultiValue,
    MultiValueFixed,
}

impl FieldType {
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::SingleValue,
        Self::SingleValueFixed,
        Self::MultiValue,
        Self::MultiValueFixed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::SingleValue => "single_value",
            Self::SingleValueFixed => "single_value_fixed",
            Self::MultiValue => "multi_value",
            Self::MultiValueFixed => "multi_value_fixed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    #[must_use]
    pub const fn is_multi_value(self) -> bool {
        matches!(self, Self::MultiValue | Self::MultiValueFixed)
    }

    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::SingleValueFixed | Self::MultiValueFixed)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! string_enum_serde {
    ($ty:ident, $expecting:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct StrVisitor;

                impl Visitor<'_> for StrVisitor {
                    type Value = $ty;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<$ty, E> {
                        Ok($ty::parse(v))
                    }
                }

                deserializer.deserialize_str(StrVisitor)
            }
        }
    };
}

string_enum_serde!(DataType, "a custom field data type string");
string_enum_serde!(FieldType, "a custom field type string");
