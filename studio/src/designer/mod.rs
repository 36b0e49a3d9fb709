//! Workflow designer state

pub mod store;

pub use store::{DesignerStore, EdgeUpdate, NodeUpdate};
