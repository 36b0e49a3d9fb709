//! Tag condition model and tag store

pub mod condition;
pub mod store;

pub use condition::{LogicOperator, TagCondition, TagOperator, TagValue};
pub use store::TagStore;
