//! FlowStudio client library
//!
//! Client-side core of the workflow designer and live debugger: the design
//! document model, its projection onto a render graph, the designer store,
//! the debug session client and the tag query model.

pub mod app;
pub mod debug;
pub mod designer;
pub mod errors;
pub mod graph;
pub mod http;
pub mod logs;
pub mod models;
pub mod tags;
pub mod utils;

