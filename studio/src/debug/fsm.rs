//! Debug session status machine
//!
//! `paused` and `running` alternate until the session ends in `completed`
//! or `error`. Commands are checked against the current status before they
//! are sent; the status after an acknowledged command is applied locally
//! without waiting for the matching push event.

use crate::http::debug::ControlCommand;
use crate::models::debug::SessionStatus;

/// Something that moves a session between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Control command acknowledged by the backend
    Command(ControlCommand),

    /// `session_paused` or `breakpoint_hit` pushed by the server
    Paused,

    /// `session_resumed`
    Resumed,

    /// `session_completed`
    Completed,

    /// `error`
    Failed,
}

/// Session status machine
#[derive(Debug, Clone)]
pub struct SessionFsm {
    status: SessionStatus,
}

impl SessionFsm {
    /// Start from the status reported by the backend at creation
    pub fn new(status: SessionStatus) -> Self {
        Self { status }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// True for `completed` and `error`
    pub fn is_terminal(&self) -> bool {
        is_terminal(self.status)
    }

    /// Whether `command` makes sense in the current status
    pub fn allows(&self, command: ControlCommand) -> bool {
        match (self.status, command) {
            (SessionStatus::Paused, ControlCommand::Step) => true,
            (SessionStatus::Paused, ControlCommand::Continue) => true,
            (SessionStatus::Running, ControlCommand::Pause) => true,
            (SessionStatus::Paused | SessionStatus::Running, ControlCommand::Stop) => true,
            _ => false,
        }
    }

    /// Process an event and transition
    ///
    /// Server-pushed events always win: they describe what already happened,
    /// so they are applied from any status. Acknowledged commands only move
    /// non-terminal sessions.
    pub fn process(&mut self, event: StatusEvent) -> Result<SessionStatus, String> {
        let next = match (self.status, event) {
            (_, StatusEvent::Paused) => SessionStatus::Paused,
            (_, StatusEvent::Resumed) => SessionStatus::Running,
            (_, StatusEvent::Completed) => SessionStatus::Completed,
            (_, StatusEvent::Failed) => SessionStatus::Error,

            // Step reports its own status in the returned snapshot
            (SessionStatus::Paused, StatusEvent::Command(ControlCommand::Step)) => {
                SessionStatus::Paused
            }
            (SessionStatus::Paused, StatusEvent::Command(ControlCommand::Continue)) => {
                SessionStatus::Running
            }
            (SessionStatus::Running, StatusEvent::Command(ControlCommand::Pause)) => {
                SessionStatus::Paused
            }
            (SessionStatus::Paused | SessionStatus::Running, StatusEvent::Command(ControlCommand::Stop)) => {
                SessionStatus::Completed
            }

            // Repeated command, already there
            (SessionStatus::Running, StatusEvent::Command(ControlCommand::Continue)) => {
                SessionStatus::Running
            }
            (SessionStatus::Paused, StatusEvent::Command(ControlCommand::Pause)) => {
                SessionStatus::Paused
            }

            (status, event) => {
                return Err(format!("Invalid transition: {} -> {:?}", status, event));
            }
        };

        self.status = next;
        Ok(next)
    }
}

/// True for `completed` and `error`
pub fn is_terminal(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Completed | SessionStatus::Error)
}
