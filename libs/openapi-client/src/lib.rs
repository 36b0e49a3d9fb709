//! Wire models for the FlowStudio backend API.
//!
//! Request bodies and the response envelope shared by every endpoint. Domain
//! types live in the `flowstudio` crate; this crate only knows the shapes
//! that cross the wire.

pub mod models;

pub use models::envelope::ApiResponse;
