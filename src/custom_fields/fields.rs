//! Custom field resources.

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DataType, DefaultValue, FieldType, FieldValue, OptionData};
use crate::resource::{Collection, Reference, Resource};

/// A selectable option of a fixed-options field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub data: OptionData,
}

/// A field defined for custom field schemas (`/customfields/fields`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "datatype", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub multi_value: bool,
    #[serde(default)]
    pub fixed_options: bool,
    /// Populated only when listed with `include[]=field_options`; options are
    /// managed through their own endpoint.
    #[serde(default, skip_serializing)]
    pub field_options: Vec<FieldOption>,
}

impl Resource for CustomField {
    const SINGULAR: &'static str = "field";
    const PLURAL: &'static str = "fields";
}

impl Collection for CustomField {
    const PATH: &'static str = "/customfields/fields";
}

/// A field configured on a custom field schema.
///
/// Has no top-level collection; use [`crate::Client::field_configurations`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub field: CustomField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
}

impl Resource for FieldConfiguration {
    const SINGULAR: &'static str = "field_configuration";
    const PLURAL: &'static str = "field_configurations";
}

/// An incident custom field (`/incidents/custom_fields`).
///
/// The bare `default_value` takes its shape from the sibling `data_type`
/// and `field_type`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncidentCustomField {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub data_type: DataType,
    pub field_type: FieldType,
    pub default_value: Option<FieldValue>,
    pub field_options: Vec<FieldOption>,
    pub summary: Option<String>,
    pub self_url: Option<String>,
}

impl Resource for IncidentCustomField {
    const SINGULAR: &'static str = "field";
    const PLURAL: &'static str = "fields";
}

impl Collection for IncidentCustomField {
    const PATH: &'static str = "/incidents/custom_fields";
}

#[derive(Serialize, Deserialize)]
struct RawIncidentCustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    data_type: DataType,
    field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    field_options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    self_url: Option<String>,
}

impl Serialize for IncidentCustomField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let default_value = self
            .default_value
            .as_ref()
            .map(|v| v.encode_as(self.data_type, self.field_type.is_multi_value()))
            .transpose()
            .map_err(ser::Error::custom)?;
        RawIncidentCustomField {
            id: self.id.clone(),
            kind: self.kind.clone(),
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            data_type: self.data_type,
            field_type: self.field_type,
            default_value,
            field_options: self.field_options.clone(),
            summary: self.summary.clone(),
            self_url: self.self_url.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IncidentCustomField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawIncidentCustomField::deserialize(deserializer)?;
        let default_value = match raw.default_value {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                FieldValue::decode(raw.data_type, raw.field_type.is_multi_value(), &v)
                    .map_err(de::Error::custom)?,
            ),
        };
        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            name: raw.name,
            display_name: raw.display_name,
            description: raw.description,
            data_type: raw.data_type,
            field_type: raw.field_type,
            default_value,
            field_options: raw.field_options,
            summary: raw.summary,
            self_url: raw.self_url,
        })
    }
}

impl IncidentCustomField {
    /// Reference to this field, for use in other payloads.
    #[must_use]
    pub fn reference(&self) -> Option<Reference> {
        self.id
            .as_deref()
            .map(|id| Reference::new(id, "field_reference"))
    }
}
