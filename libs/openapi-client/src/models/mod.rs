//! API models

pub mod envelope;

use serde::{Deserialize, Serialize};

/// Draft creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ask the backend to seed the draft with a start and an end node
    #[serde(default)]
    pub with_default_nodes: bool,
}

/// Publish response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    #[serde(alias = "definitionId")]
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Instance creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    pub definition_id: String,
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Debug session creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub instance_id: String,
    /// One of `step`, `breakpoint`, `continuous`
    pub mode: String,
}

/// Breakpoint creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBreakpointRequest {
    pub node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub enabled: bool,
}

/// Variable update request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVariableRequest {
    pub key: String,
    pub value: serde_json::Value,
}

/// Tag assignment request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTagRequest {
    pub tag_name: String,
    pub value: serde_json::Value,
}

/// Tag query request. `condition` is the serialized condition tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagQueryRequest {
    pub condition: serde_json::Value,
    pub page: u32,
    pub limit: u32,
}
