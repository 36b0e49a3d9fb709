//! Backend HTTP client and per-domain endpoints

pub mod client;
pub mod debug;
pub mod designer;
pub mod tags;

pub use client::HttpClient;
pub use debug::{ControlCommand, DebugApi};
pub use designer::DesignerApi;
pub use tags::TagApi;
