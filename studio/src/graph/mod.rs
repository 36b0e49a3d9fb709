//! Render graph projection and change application

pub mod changes;
pub mod projection;

pub use changes::{apply_edge_changes, apply_node_changes, Connection, EdgeChange, NodeChange};
pub use projection::{
    from_render_edge, from_render_node, to_render_edge, to_render_node, RenderEdge,
    RenderEdgeData, RenderNode,
};
