//! Error types for the FlowStudio client

use thiserror::Error;

/// Main error type for the FlowStudio client
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("API error {code}: {message}")]
    ApiError { code: i64, message: String },

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("No active document")]
    NoActiveDocument,

    #[error("No active debug session")]
    NoActiveSession,

    #[error("Invalid tag condition: {0}")]
    InvalidCondition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudioError {
    /// True for failures raised before any backend call was made
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            StudioError::NoActiveDocument
                | StudioError::NoActiveSession
                | StudioError::InvalidCondition(_)
        )
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(err: anyhow::Error) -> Self {
        StudioError::Internal(err.to_string())
    }
}
