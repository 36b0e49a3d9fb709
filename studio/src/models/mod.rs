//! Domain models

pub mod config;
pub mod debug;
pub mod design;
pub mod tag;
pub mod template;
pub mod validation;
