//! Response envelope

use serde::{Deserialize, Serialize};

/// Every backend response is wrapped in this envelope.
///
/// `code == 0` means success; anything else is an application-level failure
/// whatever the HTTP status was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            message: "ok".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Human readable failure text, preferring `error` over `message`
    pub fn failure_message(&self) -> String {
        match &self.error {
            Some(err) if !err.is_empty() => format!("{}: {}", self.message, err),
            _ => self.message.clone(),
        }
    }
}
