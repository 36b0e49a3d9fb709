//! Runtime options derived from settings

use std::time::Duration;

use secrecy::SecretString;

use crate::app::settings::Settings;

/// HTTP client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Backend API base URL
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Bearer token
    pub token: Option<SecretString>,

    /// Impersonated user id
    pub impersonate_user: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ClientOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            base_url: settings.backend.base_url.clone(),
            request_timeout: Duration::from_secs(settings.backend.request_timeout_secs),
            token: settings.backend.token.clone(),
            impersonate_user: settings.backend.impersonate_user.clone(),
        }
    }
}

/// Debug client options
#[derive(Debug, Clone)]
pub struct DebugOptions {
    /// Event log ring buffer capacity
    pub event_log_capacity: usize,

    /// Events endpoint template
    pub events_path: String,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for DebugOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            event_log_capacity: settings.debug.event_log_capacity.max(1),
            events_path: settings.debug.events_path.clone(),
        }
    }
}
