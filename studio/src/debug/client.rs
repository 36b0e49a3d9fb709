//! Debug session client
//!
//! Drives one remote session at a time. Control commands go through
//! [`DebugApi`]; push events arrive over the [`EventChannel`] and are folded
//! into [`DebugState`] when the caller drains the inbox with
//! [`DebugClient::pump`] or [`DebugClient::next_event`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::options::DebugOptions;
use crate::debug::channel::{parse_frame, ChannelEndpoint, ChannelMessage, EventChannel};
use crate::debug::fsm::{SessionFsm, StatusEvent};
use crate::debug::reducer::DebugState;
use crate::errors::StudioError;
use crate::http::debug::{ControlCommand, DebugApi};
use crate::models::debug::{
    Breakpoint, DebugEvent, DebugMode, DebugSession, ExecutionStep, SessionStatus,
};

/// Debug client
pub struct DebugClient {
    api: Arc<dyn DebugApi>,
    endpoint: ChannelEndpoint,
    state: DebugState,
    channel: Option<EventChannel>,
    inbox_tx: mpsc::UnboundedSender<ChannelMessage>,
    inbox_rx: mpsc::UnboundedReceiver<ChannelMessage>,
    loading: bool,
    error: Option<String>,
}

impl DebugClient {
    pub fn new(api: Arc<dyn DebugApi>, endpoint: ChannelEndpoint, options: &DebugOptions) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            api,
            endpoint,
            state: DebugState::new(options.event_log_capacity),
            channel: None,
            inbox_tx,
            inbox_rx,
            loading: false,
            error: None,
        }
    }

    pub fn state(&self) -> &DebugState {
        &self.state
    }

    pub fn session(&self) -> Option<&DebugSession> {
        self.state.session.as_ref()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.state.session.as_ref().map(|s| s.status)
    }

    pub fn highlighted_node_id(&self) -> Option<&str> {
        self.state.highlighted_node_id.as_deref()
    }

    pub fn events(&self) -> impl Iterator<Item = &DebugEvent> {
        self.state.events()
    }

    pub fn timeline(&self) -> &[ExecutionStep] {
        self.state.timeline()
    }

    /// True while an event channel task is running
    pub fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(EventChannel::is_open)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn record<T>(&mut self, op: &str, result: Result<T, StudioError>) -> Result<T, StudioError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(e) => {
                error!("Debug {} failed: {}", op, e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn active_id(&self) -> Result<String, StudioError> {
        self.state
            .session
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or(StudioError::NoActiveSession)
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Open a debug session on an existing instance
    pub async fn start_session(
        &mut self,
        instance_id: &str,
        mode: DebugMode,
    ) -> Result<DebugSession, StudioError> {
        self.loading = true;
        let result = self.api.create_session(instance_id, mode).await;
        self.loading = false;

        let session = self.record("start", result)?;
        info!(
            "Debug session {} started on {} ({})",
            session.id, instance_id, session.status
        );
        self.state.set_session(session.clone());
        Ok(session)
    }

    /// Create an instance of `definition_id` and open a session on it
    pub async fn launch(
        &mut self,
        definition_id: &str,
        variables: serde_json::Map<String, serde_json::Value>,
        mode: DebugMode,
    ) -> Result<DebugSession, StudioError> {
        self.loading = true;
        let result = self.api.create_instance(definition_id, variables).await;
        self.loading = false;

        let instance = self.record("launch", result)?;
        debug!("Created instance {} of {}", instance.id, definition_id);
        self.start_session(&instance.id, mode).await
    }

    /// Adopt an existing session
    pub async fn attach(&mut self, session_id: &str) -> Result<DebugSession, StudioError> {
        self.loading = true;
        let result = self.api.get_session(session_id).await;
        self.loading = false;

        let session = self.record("attach", result)?;
        self.state.set_session(session.clone());
        Ok(session)
    }

    pub async fn list_sessions(&mut self) -> Result<Vec<DebugSession>, StudioError> {
        let result = self.api.list_sessions().await;
        self.record("list", result)
    }

    /// Re-fetch the active session snapshot
    pub async fn refresh(&mut self) -> Result<(), StudioError> {
        let id = self.active_id()?;
        let result = self.api.get_session(&id).await;
        let session = self.record("refresh", result)?;
        self.state.set_session(session);
        Ok(())
    }

    /// Execute one step.
    ///
    /// Without a session this returns without calling the backend. Stepping
    /// a session that isn't paused is still sent; the backend rejects it.
    pub async fn step(&mut self) -> Result<Option<ExecutionStep>, StudioError> {
        let Some(session) = &self.state.session else {
            debug!("Step ignored, no active session");
            return Ok(None);
        };
        if !SessionFsm::new(session.status).allows(ControlCommand::Step) {
            warn!("Stepping session {} while {}", session.id, session.status);
        }
        let id = session.id.clone();

        self.loading = true;
        let result = self.api.step(&id).await;
        self.loading = false;

        let result = self.record("step", result)?;
        self.state.set_session(result.session);
        if let Some(step) = &result.step {
            self.state.record_step(step.clone());
        }
        debug!("Stepped to {:?}", self.state.highlighted_node_id);
        Ok(result.step)
    }

    /// Continue execution. Local status becomes `running` once acknowledged.
    pub async fn resume(&mut self) -> Result<(), StudioError> {
        self.command(ControlCommand::Continue).await
    }

    /// Pause execution. Local status becomes `paused` once acknowledged.
    pub async fn pause(&mut self) -> Result<(), StudioError> {
        self.command(ControlCommand::Pause).await
    }

    async fn command(&mut self, command: ControlCommand) -> Result<(), StudioError> {
        let id = self.active_id()?;
        let result = self.api.control(&id, command).await;
        self.record(command.as_str(), result)?;

        if let Some(session) = self.state.session.as_mut() {
            let mut fsm = SessionFsm::new(session.status);
            match fsm.process(StatusEvent::Command(command)) {
                Ok(status) => session.status = status,
                Err(e) => warn!("{}", e),
            }
        }
        Ok(())
    }

    /// Stop the session. Local state is only discarded if the backend
    /// accepted the stop.
    pub async fn stop(&mut self) -> Result<(), StudioError> {
        let id = self.active_id()?;
        let result = self.api.control(&id, ControlCommand::Stop).await;
        self.record("stop", result)?;

        info!("Debug session {} stopped", id);
        self.disconnect().await;
        self.state.clear_session();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event channel
    // ------------------------------------------------------------------

    /// Open the event channel for `session_id`. Reconnecting to the same open
    /// session is a no-op; a channel to another session is closed first.
    pub async fn connect(&mut self, session_id: &str) -> Result<(), StudioError> {
        if let Some(channel) = &self.channel {
            if channel.session_id() == session_id && channel.is_open() {
                debug!("Event channel for {} already open", session_id);
                return Ok(());
            }
        }
        self.disconnect().await;

        let result = EventChannel::connect(&self.endpoint, session_id, self.inbox_tx.clone()).await;
        let channel = self.record("connect", result)?;
        self.channel = Some(channel);
        Ok(())
    }

    /// Close the event channel if one is open
    pub async fn disconnect(&mut self) {
        if let Some(channel) = self.channel.take() {
            info!("Closing event channel for {}", channel.session_id());
            channel.close().await;
        }
        // Keep delivered events, drop the stale close notice
        while let Ok(message) = self.inbox_rx.try_recv() {
            if let ChannelMessage::Event(event) = message {
                self.state.apply_event(event);
            }
        }
    }

    /// Apply every queued event without waiting. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.inbox_rx.try_recv() {
            if self.dispatch(message).is_some() {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next event and apply it. `None` once the channel closes.
    pub async fn next_event(&mut self) -> Option<DebugEvent> {
        loop {
            if self.channel.is_none() {
                if let Ok(message) = self.inbox_rx.try_recv() {
                    if let Some(event) = self.dispatch(message) {
                        return Some(event);
                    }
                    continue;
                }
                return None;
            }

            let message = self.inbox_rx.recv().await?;
            if let Some(event) = self.dispatch(message) {
                return Some(event);
            }
        }
    }

    fn dispatch(&mut self, message: ChannelMessage) -> Option<DebugEvent> {
        match message {
            ChannelMessage::Event(event) => {
                self.state.apply_event(event.clone());
                Some(event)
            }
            ChannelMessage::Closed { session_id, reason } => {
                if self.channel.as_ref().is_some_and(|c| c.session_id() == session_id) {
                    self.channel = None;
                }
                match reason {
                    Some(reason) => warn!("Event channel for {} dropped: {}", session_id, reason),
                    None => info!("Event channel for {} closed", session_id),
                }
                None
            }
        }
    }

    /// Feed one raw frame. Malformed frames are logged and dropped.
    pub fn handle_frame(&mut self, text: &str) -> bool {
        match parse_frame(text) {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Fold one event into local state
    pub fn handle_event(&mut self, event: DebugEvent) {
        self.state.apply_event(event);
    }

    // ------------------------------------------------------------------
    // Breakpoints
    // ------------------------------------------------------------------

    pub async fn add_breakpoint(
        &mut self,
        node_id: &str,
        condition: Option<String>,
    ) -> Result<Breakpoint, StudioError> {
        let id = self.active_id()?;
        let request = Breakpoint {
            node_id: node_id.to_string(),
            condition,
            enabled: true,
        };
        let result = self.api.add_breakpoint(&id, &request).await;
        let breakpoint = self.record("breakpoint add", result)?;

        if let Some(session) = self.state.session.as_mut() {
            session
                .breakpoints
                .insert(breakpoint.node_id.clone(), breakpoint.clone());
        }
        Ok(breakpoint)
    }

    pub async fn remove_breakpoint(&mut self, node_id: &str) -> Result<(), StudioError> {
        let id = self.active_id()?;
        let result = self.api.remove_breakpoint(&id, node_id).await;
        self.record("breakpoint remove", result)?;

        if let Some(session) = self.state.session.as_mut() {
            session.breakpoints.remove(node_id);
        }
        Ok(())
    }

    /// Flip a breakpoint's `enabled` flag locally. The backend is not told.
    ///
    /// Returns the new flag, or `None` when there is no such breakpoint.
    pub fn toggle_breakpoint(&mut self, node_id: &str) -> Option<bool> {
        let breakpoint = self
            .state
            .session
            .as_mut()?
            .breakpoints
            .get_mut(node_id)?;
        breakpoint.enabled = !breakpoint.enabled;
        Some(breakpoint.enabled)
    }

    // ------------------------------------------------------------------
    // Variables and timeline
    // ------------------------------------------------------------------

    pub async fn get_variables(&mut self) -> Result<HashMap<String, serde_json::Value>, StudioError> {
        let id = self.active_id()?;
        let result = self.api.get_variables(&id).await;
        let variables = self.record("variable load", result)?;

        if let Some(session) = self.state.session.as_mut() {
            session.variables = variables.clone();
        }
        Ok(variables)
    }

    pub async fn set_variable(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StudioError> {
        let id = self.active_id()?;
        let result = self.api.set_variable(&id, key, value).await;
        let variables = self.record("variable set", result)?;

        if let Some(session) = self.state.session.as_mut() {
            session.variables = variables;
        }
        Ok(())
    }

    pub async fn load_timeline(&mut self) -> Result<&[ExecutionStep], StudioError> {
        let id = self.active_id()?;
        let result = self.api.get_timeline(&id).await;
        let timeline = self.record("timeline load", result)?;
        self.state.set_timeline(timeline);
        Ok(self.state.timeline())
    }
}

impl Drop for DebugClient {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.take() {
            debug!("Dropping event channel for {}", channel.session_id());
        }
    }
}
