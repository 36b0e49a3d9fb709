//! Debug event channel
//!
//! One websocket per session. A background task reads frames and forwards
//! decoded events to the owning client's inbox; the client applies them on
//! its own task, so session state has a single writer.

use futures::{SinkExt, StreamExt};
use http::header::{HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::options::{ClientOptions, DebugOptions};
use crate::errors::StudioError;
use crate::http::client::IMPERSONATE_HEADER;
use crate::models::debug::DebugEvent;

/// What the channel task hands to the client
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Event(DebugEvent),

    /// The connection ended. `reason` is set when it ended on an error.
    Closed {
        session_id: String,
        reason: Option<String>,
    },
}

/// Where and how to open event channels
#[derive(Debug, Clone)]
pub struct ChannelEndpoint {
    pub base_url: String,
    /// Path template, `{id}` is replaced by the session id
    pub events_path: String,
    pub token: Option<SecretString>,
    pub impersonate_user: Option<String>,
}

impl ChannelEndpoint {
    pub fn new(client: &ClientOptions, debug: &DebugOptions) -> Self {
        Self {
            base_url: client.base_url.clone(),
            events_path: debug.events_path.clone(),
            token: client.token.clone(),
            impersonate_user: client.impersonate_user.clone(),
        }
    }

    /// Websocket URL of the events stream for `session_id`
    pub fn url_for(&self, session_id: &str) -> Result<Url, StudioError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| StudioError::ConfigError(e.to_string()))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(StudioError::ConfigError(format!(
                    "Unsupported backend URL scheme: {}",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| StudioError::ConfigError("Failed to set scheme".to_string()))?;

        let path = self.events_path.replace("{id}", session_id);
        url.set_path(&format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        ));
        Ok(url)
    }

    fn request(
        &self,
        session_id: &str,
    ) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, StudioError> {
        let url = self.url_for(session_id)?;
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();

        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                header_value(AUTHORIZATION.as_str(), &format!("Bearer {}", token.expose_secret()))?,
            );
        }
        if let Some(user) = &self.impersonate_user {
            headers.insert(HeaderName::from_static("x-impersonate-user"), header_value(IMPERSONATE_HEADER, user)?);
        }
        Ok(request)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, StudioError> {
    HeaderValue::from_str(value)
        .map_err(|e| StudioError::ConfigError(format!("Invalid value for {}: {}", name, e)))
}

/// Decode one frame. Bad frames are logged and dropped.
pub fn parse_frame(text: &str) -> Option<DebugEvent> {
    match serde_json::from_str::<DebugEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Dropping malformed debug frame ({}): {:.120}", e, text);
            None
        }
    }
}

/// Handle to a running channel task
pub struct EventChannel {
    session_id: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EventChannel {
    /// Open the websocket and start forwarding into `inbox`.
    ///
    /// Fails if the handshake fails; errors after that arrive as
    /// [`ChannelMessage::Closed`].
    pub async fn connect(
        endpoint: &ChannelEndpoint,
        session_id: &str,
        inbox: mpsc::UnboundedSender<ChannelMessage>,
    ) -> Result<Self, StudioError> {
        let request = endpoint.request(session_id)?;
        info!("Connecting debug event channel: {}", request.uri());

        let (ws_stream, _) = connect_async(request).await?;
        info!("Debug event channel open for session {}", session_id);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(ws_stream, session_id.to_string(), inbox, shutdown_rx));

        Ok(Self {
            session_id: session_id.to_string(),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// False once the task has exited
    pub fn is_open(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Close the socket and wait for the task to exit
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Debug event channel task failed: {}", e);
            }
        }
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn run<S>(
    mut ws_stream: tokio_tungstenite::WebSocketStream<S>,
    session_id: String,
    inbox: mpsc::UnboundedSender<ChannelMessage>,
    mut shutdown: oneshot::Receiver<()>,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let reason = loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Closing debug event channel for {}", session_id);
                let _ = ws_stream.close(None).await;
                break None;
            }
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_frame(text.as_str()) {
                            if inbox.send(ChannelMessage::Event(event)).is_err() {
                                debug!("Debug client gone, closing channel");
                                let _ = ws_stream.close(None).await;
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_stream.send(Message::Pong(data)).await {
                            break Some(e.to_string());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed debug event channel for {}", session_id);
                        break None;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Debug event channel error: {}", e);
                        break Some(e.to_string());
                    }
                }
            }
        }
    };

    let _ = inbox.send(ChannelMessage::Closed { session_id, reason });
}
