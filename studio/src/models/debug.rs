//! Debug session models

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote debugging session attached to one workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSession {
    pub id: String,

    #[serde(default)]
    pub instance_id: String,

    #[serde(default)]
    pub definition_id: String,

    #[serde(default)]
    pub mode: DebugMode,

    pub status: SessionStatus,

    #[serde(default)]
    pub current_token: Option<TokenSnapshot>,

    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,

    /// Breakpoints keyed by node id
    #[serde(default)]
    pub breakpoints: HashMap<String, Breakpoint>,

    #[serde(default)]
    pub timeline: Vec<ExecutionStep>,
}

impl DebugSession {
    /// Node the current execution pointer sits on
    pub fn current_node_id(&self) -> Option<&str> {
        self.current_token
            .as_ref()
            .and_then(|t| t.current_node_id.as_deref())
    }
}

/// Debug execution mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    #[default]
    Step,
    Breakpoint,
    Continuous,
}

impl DebugMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugMode::Step => "step",
            DebugMode::Breakpoint => "breakpoint",
            DebugMode::Continuous => "continuous",
        }
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Paused,
    Running,
    Completed,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Paused => "paused",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot of the server-side execution pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub id: String,
    #[serde(default)]
    pub current_node_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Node ids visited so far
    #[serde(default)]
    pub path: Vec<String>,
}

/// A node-addressed pause condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub node_id: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One record of the execution timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    pub id: u64,
    pub step_index: u64,
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub token_id: String,
    pub action: StepAction,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    /// Milliseconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Enter,
    Exit,
}

/// Reply to a step command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub session: DebugSession,
    #[serde(default)]
    pub step: Option<ExecutionStep>,
}

/// A push event from the session's event channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    #[serde(rename = "type")]
    pub event_type: DebugEventType,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl DebugEvent {
    /// `payload.nodeId` if present
    pub fn node_id(&self) -> Option<&str> {
        self.payload.get("nodeId").and_then(|v| v.as_str())
    }
}

/// Event kinds pushed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugEventType {
    NodeEntered,
    NodeExited,
    BreakpointHit,
    SessionPaused,
    SessionResumed,
    SessionCompleted,
    VariableChanged,
    Error,
    #[serde(other)]
    Unknown,
}

/// A running workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: String,
    #[serde(default)]
    pub definition_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}
