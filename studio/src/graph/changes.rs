//! Incremental change sets emitted by the renderer

use serde::{Deserialize, Serialize};

use crate::graph::projection::{RenderEdge, RenderNode};
use crate::models::design::Position;

/// A single node change reported by the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    Position {
        id: String,
        #[serde(default)]
        position: Option<Position>,
        #[serde(default)]
        dragging: bool,
    },
    Dimensions {
        id: String,
        width: f64,
        height: f64,
    },
    Select {
        id: String,
        selected: bool,
    },
    Remove {
        id: String,
    },
    Add {
        item: RenderNode,
    },
    Replace {
        id: String,
        item: RenderNode,
    },
}

/// A single edge change reported by the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: RenderEdge },
    Replace { id: String, item: RenderEdge },
}

/// A completed drag-to-connect gesture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }
}

/// Apply `changes` in order. Changes naming unknown ids are skipped.
pub fn apply_node_changes(changes: &[NodeChange], mut nodes: Vec<RenderNode>) -> Vec<RenderNode> {
    for change in changes {
        match change {
            NodeChange::Position {
                id,
                position,
                dragging,
            } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    if let Some(position) = position {
                        node.position = *position;
                    }
                    node.dragging = *dragging;
                }
            }
            NodeChange::Dimensions { id, width, height } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    node.width = Some(*width);
                    node.height = Some(*height);
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => nodes.retain(|n| &n.id != id),
            NodeChange::Add { item } => nodes.push(item.clone()),
            NodeChange::Replace { id, item } => {
                if let Some(node) = nodes.iter_mut().find(|n| &n.id == id) {
                    *node = item.clone();
                }
            }
        }
    }
    nodes
}

/// Apply `changes` in order. Changes naming unknown ids are skipped.
pub fn apply_edge_changes(changes: &[EdgeChange], mut edges: Vec<RenderEdge>) -> Vec<RenderEdge> {
    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = edges.iter_mut().find(|e| &e.id == id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => edges.retain(|e| &e.id != id),
            EdgeChange::Add { item } => edges.push(item.clone()),
            EdgeChange::Replace { id, item } => {
                if let Some(edge) = edges.iter_mut().find(|e| &e.id == id) {
                    *edge = item.clone();
                }
            }
        }
    }
    edges
}

/// Ids removed by a node change set
pub fn removed_node_ids(changes: &[NodeChange]) -> Vec<&str> {
    changes
        .iter()
        .filter_map(|c| match c {
            NodeChange::Remove { id } => Some(id.as_str()),
            _ => None,
        })
        .collect()
}
