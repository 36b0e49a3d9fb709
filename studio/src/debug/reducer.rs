//! Local debug state and event reduction

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::debug::fsm::{SessionFsm, StatusEvent};
use crate::models::debug::{DebugEvent, DebugEventType, DebugSession, ExecutionStep};

/// Default number of events kept in the log
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 500;

/// Everything the debugger view renders from
#[derive(Debug, Clone)]
pub struct DebugState {
    pub session: Option<DebugSession>,
    pub highlighted_node_id: Option<String>,
    events: VecDeque<DebugEvent>,
    capacity: usize,
}

impl DebugState {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            session: None,
            highlighted_node_id: None,
            events: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Received events, oldest first. Only the newest `capacity` are kept.
    pub fn events(&self) -> impl Iterator<Item = &DebugEvent> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Install a fresh snapshot and derive the highlight from its token.
    ///
    /// A snapshot of the same session that carries no timeline keeps the one
    /// already loaded. Switching sessions always takes the new snapshot's.
    pub fn set_session(&mut self, mut session: DebugSession) {
        self.highlighted_node_id = session.current_node_id().map(str::to_string);
        if let Some(previous) = self.session.take() {
            if previous.id == session.id && session.timeline.is_empty() {
                session.timeline = previous.timeline;
            }
        }
        self.session = Some(session);
    }

    /// Drop session state. The event log is kept for inspection.
    pub fn clear_session(&mut self) {
        self.session = None;
        self.highlighted_node_id = None;
    }

    /// Steps executed so far in the active session
    pub fn timeline(&self) -> &[ExecutionStep] {
        self.session.as_ref().map_or(&[], |s| s.timeline.as_slice())
    }

    /// Replace the active session's timeline
    pub fn set_timeline(&mut self, timeline: Vec<ExecutionStep>) {
        if let Some(session) = self.session.as_mut() {
            session.timeline = timeline;
        }
    }

    /// Append `step` unless a step with the same id is already recorded
    pub fn record_step(&mut self, step: ExecutionStep) {
        if let Some(session) = self.session.as_mut() {
            if session.timeline.iter().all(|s| s.id != step.id) {
                session.timeline.push(step);
            }
        }
    }

    fn push_event(&mut self, event: DebugEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Record `event` and fold it into the session.
    ///
    /// Every reduction is a last-write-wins assignment, so replaying an event
    /// leaves the state where a single application did.
    pub fn apply_event(&mut self, event: DebugEvent) {
        if let Some(session) = &self.session {
            if !event.session_id.is_empty() && event.session_id != session.id {
                warn!(
                    "Ignoring {:?} for session {} while attached to {}",
                    event.event_type, event.session_id, session.id
                );
                self.push_event(event);
                return;
            }
        }

        match event.event_type {
            DebugEventType::NodeEntered => {
                self.highlight(&event);
            }
            DebugEventType::BreakpointHit => {
                self.highlight(&event);
                self.transition(StatusEvent::Paused);
            }
            DebugEventType::NodeExited => {
                debug!("Node exited: {:?}", event.node_id());
            }
            DebugEventType::SessionPaused => self.transition(StatusEvent::Paused),
            DebugEventType::SessionResumed => self.transition(StatusEvent::Resumed),
            DebugEventType::SessionCompleted => {
                self.transition(StatusEvent::Completed);
                self.highlighted_node_id = None;
            }
            DebugEventType::VariableChanged => self.merge_variable(&event),
            DebugEventType::Error => {
                warn!("Session error: {}", event.payload);
                self.transition(StatusEvent::Failed);
            }
            DebugEventType::Unknown => {
                debug!("Ignoring unknown debug event");
            }
        }

        self.push_event(event);
    }

    fn highlight(&mut self, event: &DebugEvent) {
        if let Some(node_id) = event.node_id() {
            self.highlighted_node_id = Some(node_id.to_string());
        }
    }

    fn transition(&mut self, event: StatusEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut fsm = SessionFsm::new(session.status);
        match fsm.process(event) {
            Ok(status) => session.status = status,
            Err(e) => warn!("{}", e),
        }
    }

    fn merge_variable(&mut self, event: &DebugEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let key = event
            .payload
            .get("key")
            .or_else(|| event.payload.get("name"))
            .and_then(|v| v.as_str());

        match key {
            Some(key) => {
                let value = event
                    .payload
                    .get("value")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                session.variables.insert(key.to_string(), value);
            }
            None => warn!("variable_changed without a key: {}", event.payload),
        }
    }
}

impl Default for DebugState {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
