//! Application context: the shared HTTP client and the three stores

use std::sync::Arc;

use tracing::info;

use crate::app::options::{ClientOptions, DebugOptions};
use crate::app::settings::Settings;
use crate::debug::channel::ChannelEndpoint;
use crate::debug::client::DebugClient;
use crate::designer::store::DesignerStore;
use crate::errors::StudioError;
use crate::http::client::HttpClient;
use crate::tags::store::TagStore;

/// Everything a front end needs to drive the studio
pub struct StudioContext {
    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Workflow designer state
    pub designer: DesignerStore,

    /// Debug session client
    pub debugger: DebugClient,

    /// Tag catalog and queries
    pub tags: TagStore,
}

impl StudioContext {
    /// Build the context from loaded settings
    pub fn new(settings: &Settings) -> Result<Self, StudioError> {
        let client_options = ClientOptions::from(settings);
        let debug_options = DebugOptions::from(settings);

        let http_client = Arc::new(HttpClient::new(&client_options)?);
        info!("Backend: {}", http_client.base_url());

        let endpoint = ChannelEndpoint::new(&client_options, &debug_options);

        Ok(Self {
            designer: DesignerStore::new(http_client.clone()),
            debugger: DebugClient::new(http_client.clone(), endpoint, &debug_options),
            tags: TagStore::new(http_client.clone()),
            http_client,
        })
    }
}
