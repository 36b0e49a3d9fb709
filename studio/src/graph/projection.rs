//! Projection between the design document and the render graph
//!
//! The renderer works on [`RenderNode`]/[`RenderEdge`]: positions are free
//! floats, the node's display name lives in `data.label`, and edge branch
//! settings ride along in a side payload. Going back to the document strips
//! the synthesized label and rounds positions to whole pixels, so saving is
//! lossy for sub-pixel coordinates.
//!
//! None of these functions fail. Partially loaded data yields empty strings
//! rather than errors so the editor keeps working.

use serde::{Deserialize, Serialize};

use crate::models::design::{
    DesignerEdge, DesignerNode, EdgeCondition, EdgeStyle, NodeType, PortConfig, Position,
    PropertyBag, WorkflowDesign,
};

/// Key under which the node name is exposed to the renderer
pub const LABEL_KEY: &str = "label";

/// Renderer-facing node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub position: Position,
    /// Property bag plus the synthesized `label`
    #[serde(default)]
    pub data: PropertyBag,
    /// Connection points, drawn as handles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handles: Option<PortConfig>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl RenderNode {
    /// Display name carried in `data.label`
    pub fn label(&self) -> &str {
        self.data
            .get(LABEL_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

/// Renderer-facing edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RenderEdgeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
    #[serde(default)]
    pub selected: bool,
}

/// Side payload that keeps branch settings across a round trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderEdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EdgeCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

pub fn to_render_node(node: &DesignerNode) -> RenderNode {
    let mut data = node.properties.clone();
    data.insert(
        LABEL_KEY.to_string(),
        serde_json::Value::String(node.name.clone()),
    );

    RenderNode {
        id: node.id.clone(),
        node_type: node.node_type.clone(),
        position: node.position,
        data,
        handles: node.ports.clone(),
        selected: false,
        dragging: false,
        width: None,
        height: None,
    }
}

pub fn to_render_edge(edge: &DesignerEdge) -> RenderEdge {
    let data = if edge.condition.is_some() || edge.priority.is_some() {
        Some(RenderEdgeData {
            condition: edge.condition.clone(),
            priority: edge.priority,
        })
    } else {
        None
    };

    RenderEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        source_handle: edge.source_port.clone(),
        target_handle: edge.target_port.clone(),
        label: edge.label.clone(),
        data,
        style: edge.style.clone(),
        selected: false,
    }
}

pub fn from_render_node(node: &RenderNode) -> DesignerNode {
    let mut properties = node.data.clone();
    let name = match properties.remove(LABEL_KEY) {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    };

    DesignerNode {
        id: node.id.clone(),
        node_type: node.node_type.clone(),
        name,
        position: node.position.rounded(),
        properties,
        ports: node.handles.clone(),
    }
}

pub fn from_render_edge(edge: &RenderEdge) -> DesignerEdge {
    let data = edge.data.clone().unwrap_or_default();

    DesignerEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        source_port: edge.source_handle.clone(),
        target_port: edge.target_handle.clone(),
        label: edge.label.clone(),
        condition: data.condition,
        priority: data.priority,
        style: edge.style.clone(),
    }
}

/// Project a whole document into render nodes and edges
pub fn to_render_graph(design: &WorkflowDesign) -> (Vec<RenderNode>, Vec<RenderEdge>) {
    (
        design.nodes.iter().map(to_render_node).collect(),
        design.edges.iter().map(to_render_edge).collect(),
    )
}

/// Copy of `design` with its graph replaced by the render graph
pub fn apply_render_graph(
    design: &WorkflowDesign,
    nodes: &[RenderNode],
    edges: &[RenderEdge],
) -> WorkflowDesign {
    WorkflowDesign {
        nodes: nodes.iter().map(from_render_node).collect(),
        edges: edges.iter().map(from_render_edge).collect(),
        ..design.clone()
    }
}
