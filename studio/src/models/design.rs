//! Design document models
//!
//! The canonical workflow document exchanged with the backend. Field names
//! follow the backend's camelCase JSON.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open-ended key/value payload attached to nodes
pub type PropertyBag = serde_json::Map<String, serde_json::Value>;

/// A workflow design document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDesign {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Version tag assigned by the backend
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub status: DesignStatus,

    #[serde(default)]
    pub nodes: Vec<DesignerNode>,

    #[serde(default)]
    pub edges: Vec<DesignerEdge>,

    #[serde(default)]
    pub variables: HashMap<String, Variable>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DesignMetadata>,
}

impl WorkflowDesign {
    pub fn node(&self, id: &str) -> Option<&DesignerNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&DesignerEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges whose source or target is missing from the node set
    pub fn dangling_edges(&self) -> Vec<&DesignerEdge> {
        self.edges
            .iter()
            .filter(|e| self.node(&e.source).is_none() || self.node(&e.target).is_none())
            .collect()
    }
}

/// Design lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignStatus {
    #[default]
    Draft,
    Published,
    Deprecated,
}

/// Optional document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignMetadata {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}

/// Canvas viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

/// Node position on the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Round both coordinates to the nearest integer
    pub fn rounded(self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
        }
    }
}

/// Node type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Start,
    End,
    UserTask,
    ServiceTask,
    ScriptTask,
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
    SubProcess,
    /// Type string the client does not know about
    Custom(String),
}

impl NodeType {
    pub const ALL: [NodeType; 9] = [
        NodeType::Start,
        NodeType::End,
        NodeType::UserTask,
        NodeType::ServiceTask,
        NodeType::ScriptTask,
        NodeType::ExclusiveGateway,
        NodeType::ParallelGateway,
        NodeType::InclusiveGateway,
        NodeType::SubProcess,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::UserTask => "user_task",
            NodeType::ServiceTask => "service_task",
            NodeType::ScriptTask => "script_task",
            NodeType::ExclusiveGateway => "exclusive_gateway",
            NodeType::ParallelGateway => "parallel_gateway",
            NodeType::InclusiveGateway => "inclusive_gateway",
            NodeType::SubProcess => "sub_process",
            NodeType::Custom(s) => s.as_str(),
        }
    }

    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            NodeType::ExclusiveGateway | NodeType::ParallelGateway | NodeType::InclusiveGateway
        )
    }
}

/// An untyped node reads as an empty custom type
impl Default for NodeType {
    fn default() -> Self {
        NodeType::Custom(String::new())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "start" => NodeType::Start,
            "end" => NodeType::End,
            "user_task" => NodeType::UserTask,
            "service_task" => NodeType::ServiceTask,
            "script_task" => NodeType::ScriptTask,
            "exclusive_gateway" => NodeType::ExclusiveGateway,
            "parallel_gateway" => NodeType::ParallelGateway,
            "inclusive_gateway" => NodeType::InclusiveGateway,
            "sub_process" => NodeType::SubProcess,
            _ => NodeType::Custom(s),
        }
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        NodeType::from(s.to_string())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        match t {
            NodeType::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A node in the design document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerNode {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub position: Position,

    /// Type-specific configuration, see [`crate::models::config::NodeConfig`]
    #[serde(default)]
    pub properties: PropertyBag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<PortConfig>,
}

/// Named connection points of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortConfig {
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

/// A port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub position: PortSide,
}

/// Side of the node a port is drawn on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
}

/// An edge in the design document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignerEdge {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EdgeCondition>,

    /// Orders conditional branches leaving the same node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

/// Branch condition on an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCondition {
    #[serde(rename = "type", default)]
    pub condition_type: ConditionType,
    #[serde(default)]
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
}

/// How a condition expression is interpreted by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    #[default]
    Simple,
    Expression,
    Script,
}

/// Visual style of an edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub animated: bool,
}

/// A workflow variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Declared type of a workflow variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    String,
    Number,
    Boolean,
    Object,
    Array,
}
