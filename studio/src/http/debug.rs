//! Debug and instance API client

use std::collections::HashMap;

use async_trait::async_trait;
use openapi_client::models::{
    AddBreakpointRequest, CreateInstanceRequest, CreateSessionRequest, SetVariableRequest,
};

use crate::errors::StudioError;
use crate::http::client::{api_path, HttpClient};
use crate::models::debug::{
    Breakpoint, DebugMode, DebugSession, ExecutionStep, StepResult, WorkflowInstance,
};

/// Debug control commands without a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Step,
    Continue,
    Pause,
    Stop,
}

impl ControlCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCommand::Step => "step",
            ControlCommand::Continue => "continue",
            ControlCommand::Pause => "pause",
            ControlCommand::Stop => "stop",
        }
    }
}

/// Backend operations used by the debug client
#[async_trait]
pub trait DebugApi: Send + Sync {
    async fn create_instance(
        &self,
        definition_id: &str,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WorkflowInstance, StudioError>;

    async fn get_instance(&self, id: &str) -> Result<WorkflowInstance, StudioError>;

    async fn create_session(&self, instance_id: &str, mode: DebugMode) -> Result<DebugSession, StudioError>;

    async fn get_session(&self, id: &str) -> Result<DebugSession, StudioError>;

    async fn list_sessions(&self) -> Result<Vec<DebugSession>, StudioError>;

    async fn step(&self, id: &str) -> Result<StepResult, StudioError>;

    /// Send continue, pause or stop. The reply body carries nothing the
    /// client relies on.
    async fn control(&self, id: &str, command: ControlCommand) -> Result<(), StudioError>;

    async fn add_breakpoint(&self, id: &str, breakpoint: &Breakpoint) -> Result<Breakpoint, StudioError>;

    async fn remove_breakpoint(&self, id: &str, node_id: &str) -> Result<(), StudioError>;

    async fn get_variables(&self, id: &str) -> Result<HashMap<String, serde_json::Value>, StudioError>;

    async fn set_variable(
        &self,
        id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<HashMap<String, serde_json::Value>, StudioError>;

    async fn get_timeline(&self, id: &str) -> Result<Vec<ExecutionStep>, StudioError>;
}

#[async_trait]
impl DebugApi for HttpClient {
    async fn create_instance(
        &self,
        definition_id: &str,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WorkflowInstance, StudioError> {
        let request = CreateInstanceRequest {
            definition_id: definition_id.to_string(),
            variables,
        };
        self.post("/instances", &request).await
    }

    async fn get_instance(&self, id: &str) -> Result<WorkflowInstance, StudioError> {
        let path = api_path(&["instances", id])?;
        self.get(&path).await
    }

    async fn create_session(&self, instance_id: &str, mode: DebugMode) -> Result<DebugSession, StudioError> {
        let request = CreateSessionRequest {
            instance_id: instance_id.to_string(),
            mode: mode.as_str().to_string(),
        };
        self.post("/debug/sessions", &request).await
    }

    async fn get_session(&self, id: &str) -> Result<DebugSession, StudioError> {
        let path = api_path(&["debug", "sessions", id])?;
        self.get(&path).await
    }

    async fn list_sessions(&self) -> Result<Vec<DebugSession>, StudioError> {
        self.get("/debug/sessions").await
    }

    async fn step(&self, id: &str) -> Result<StepResult, StudioError> {
        let path = api_path(&["debug", "sessions", id, "step"])?;
        self.post_command(&path)
            .await?
            .ok_or_else(|| StudioError::EmptyResponse(path.clone()))
    }

    async fn control(&self, id: &str, command: ControlCommand) -> Result<(), StudioError> {
        let path = api_path(&["debug", "sessions", id, command.as_str()])?;
        let _: Option<serde_json::Value> = self.post_command(&path).await?;
        Ok(())
    }

    async fn add_breakpoint(&self, id: &str, breakpoint: &Breakpoint) -> Result<Breakpoint, StudioError> {
        let path = api_path(&["debug", "sessions", id, "breakpoints"])?;
        let request = AddBreakpointRequest {
            node_id: breakpoint.node_id.clone(),
            condition: breakpoint.condition.clone(),
            enabled: breakpoint.enabled,
        };
        self.post(&path, &request).await
    }

    async fn remove_breakpoint(&self, id: &str, node_id: &str) -> Result<(), StudioError> {
        let path = api_path(&["debug", "sessions", id, "breakpoints", node_id])?;
        self.delete(&path).await
    }

    async fn get_variables(&self, id: &str) -> Result<HashMap<String, serde_json::Value>, StudioError> {
        let path = api_path(&["debug", "sessions", id, "variables"])?;
        self.get(&path).await
    }

    async fn set_variable(
        &self,
        id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<HashMap<String, serde_json::Value>, StudioError> {
        let path = api_path(&["debug", "sessions", id, "variables"])?;
        let request = SetVariableRequest {
            key: key.to_string(),
            value,
        };
        self.put(&path, &request).await
    }

    async fn get_timeline(&self, id: &str) -> Result<Vec<ExecutionStep>, StudioError> {
        let path = api_path(&["debug", "sessions", id, "timeline"])?;
        self.get(&path).await
    }
}
