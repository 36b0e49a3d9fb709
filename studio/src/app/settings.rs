//! Settings file management

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::StudioError;
use crate::logs::LogLevel;

/// Client settings, read from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Debugger configuration
    #[serde(default)]
    pub debug: DebugSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            backend: BackendSettings::default(),
            debug: DebugSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StudioError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            StudioError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, StudioError> {
        serde_json::from_str(raw).map_err(|e| StudioError::ConfigError(e.to_string()))
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bearer token attached to every request
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    /// Sent as `X-Impersonate-User` when set
    #[serde(default)]
    pub impersonate_user: Option<String>,
}

fn default_backend_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            token: None,
            impersonate_user: None,
        }
    }
}

/// Debugger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Number of events kept in the local event log
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    /// Events endpoint, `{id}` is replaced by the session id
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

fn default_event_log_capacity() -> usize {
    500
}

fn default_events_path() -> String {
    "/debug/sessions/{id}/events".to_string()
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            event_log_capacity: default_event_log_capacity(),
            events_path: default_events_path(),
        }
    }
}
