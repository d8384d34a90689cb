//! Incident workflow triggers.
//!
//! Trigger listings page by token rather than offset, and every call must
//! opt in to the early-access API with an `x-early-access` header.

use serde::{Deserialize, Serialize};

use crate::resource::{Collection, Pagination, Resource};

/// Header value that opts in to the incident workflows API.
pub const EARLY_ACCESS: &str = "incident-workflows-early-access";

/// What starts a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Conditional,
    #[serde(other)]
    Unknown,
}

impl TriggerType {
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Any object reference carrying at least an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentWorkflow {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPermissions {
    #[serde(default)]
    pub restricted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// An incident workflow trigger (`/incident_workflows/triggers`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentWorkflowTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<TriggerType>,
    #[serde(default, skip_serializing)]
    pub trigger_type_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub trigger_url: Option<String>,
    #[serde(rename = "self", default, skip_serializing)]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<IncidentWorkflow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ObjectRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_subscribed_to_all_services: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<TriggerPermissions>,
}

impl Resource for IncidentWorkflowTrigger {
    const SINGULAR: &'static str = "trigger";
    const PLURAL: &'static str = "triggers";
    const PAGINATION: Pagination = Pagination::Token;
    const HEADERS: &'static [(&'static str, &'static str)] = &[("x-early-access", EARLY_ACCESS)];
}

impl Collection for IncidentWorkflowTrigger {
    const PATH: &'static str = "/incident_workflows/triggers";
}
