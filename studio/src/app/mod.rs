//! Application configuration and context

pub mod context;
pub mod options;
pub mod settings;
