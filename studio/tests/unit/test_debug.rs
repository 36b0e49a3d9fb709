//! Debug client tests against a scripted backend

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use flowstudio::app::options::DebugOptions;
use flowstudio::debug::{ChannelEndpoint, DebugClient};
use flowstudio::errors::StudioError;
use flowstudio::http::{ControlCommand, DebugApi};
use flowstudio::models::debug::{
    Breakpoint, DebugMode, DebugSession, ExecutionStep, SessionStatus, StepResult,
    WorkflowInstance,
};

#[derive(Default)]
struct MockDebug {
    calls: Mutex<Vec<String>>,
    steps: Mutex<VecDeque<StepResult>>,
    fail_stop: bool,
    variables: Mutex<HashMap<String, serde_json::Value>>,
}

impl MockDebug {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn called(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn session_at(node_id: Option<&str>, status: &str) -> DebugSession {
    let token = node_id.map(|id| json!({"id": "tok-1", "currentNodeId": id}));
    serde_json::from_value(json!({
        "id": "sess-1",
        "instanceId": "inst-1",
        "definitionId": "def-1",
        "mode": "step",
        "status": status,
        "currentToken": token,
    }))
    .unwrap()
}

#[async_trait]
impl DebugApi for MockDebug {
    async fn create_instance(
        &self,
        definition_id: &str,
        _variables: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WorkflowInstance, StudioError> {
        self.called(format!("create_instance {}", definition_id));
        Ok(serde_json::from_value(json!({"id": "inst-1", "definitionId": definition_id}))?)
    }

    async fn get_instance(&self, id: &str) -> Result<WorkflowInstance, StudioError> {
        self.called(format!("get_instance {}", id));
        Ok(serde_json::from_value(json!({"id": id}))?)
    }

    async fn create_session(&self, instance_id: &str, mode: DebugMode) -> Result<DebugSession, StudioError> {
        self.called(format!("create_session {} {}", instance_id, mode.as_str()));
        Ok(session_at(Some("task-1"), "paused"))
    }

    async fn get_session(&self, id: &str) -> Result<DebugSession, StudioError> {
        self.called(format!("get_session {}", id));
        let mut session = session_at(Some("task-1"), "running");
        session.id = id.to_string();
        Ok(session)
    }

    async fn list_sessions(&self) -> Result<Vec<DebugSession>, StudioError> {
        self.called("list_sessions");
        Ok(vec![session_at(None, "paused")])
    }

    async fn step(&self, id: &str) -> Result<StepResult, StudioError> {
        self.called(format!("step {}", id));
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| StudioError::ApiError {
                code: 409,
                message: "session is not paused".to_string(),
            })
    }

    async fn control(&self, id: &str, command: ControlCommand) -> Result<(), StudioError> {
        self.called(format!("{} {}", command.as_str(), id));
        if command == ControlCommand::Stop && self.fail_stop {
            return Err(StudioError::StatusError {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }

    async fn add_breakpoint(&self, id: &str, breakpoint: &Breakpoint) -> Result<Breakpoint, StudioError> {
        self.called(format!("add_breakpoint {} {}", id, breakpoint.node_id));
        Ok(breakpoint.clone())
    }

    async fn remove_breakpoint(&self, id: &str, node_id: &str) -> Result<(), StudioError> {
        self.called(format!("remove_breakpoint {} {}", id, node_id));
        Ok(())
    }

    async fn get_variables(&self, id: &str) -> Result<HashMap<String, serde_json::Value>, StudioError> {
        self.called(format!("get_variables {}", id));
        Ok(self.variables.lock().unwrap().clone())
    }

    async fn set_variable(
        &self,
        id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<HashMap<String, serde_json::Value>, StudioError> {
        self.called(format!("set_variable {} {}", id, key));
        let mut variables = self.variables.lock().unwrap();
        variables.insert(key.to_string(), value);
        Ok(variables.clone())
    }

    async fn get_timeline(&self, id: &str) -> Result<Vec<ExecutionStep>, StudioError> {
        self.called(format!("get_timeline {}", id));
        Ok(serde_json::from_value(json!([{
            "id": 1,
            "stepIndex": 0,
            "timestamp": "2026-03-01T10:00:00Z",
            "nodeId": "task-1",
            "tokenId": "tok-1",
            "action": "enter"
        }]))?)
    }
}

fn client(api: Arc<MockDebug>) -> DebugClient {
    let endpoint = ChannelEndpoint {
        base_url: "http://127.0.0.1:9/api".to_string(),
        events_path: "/debug/sessions/{id}/events".to_string(),
        token: None,
        impersonate_user: None,
    };
    let options = DebugOptions {
        event_log_capacity: 16,
        events_path: endpoint.events_path.clone(),
    };
    DebugClient::new(api, endpoint, &options)
}

#[tokio::test]
async fn test_step_advances_highlight() {
    let api = Arc::new(MockDebug::default());
    api.steps.lock().unwrap().push_back(StepResult {
        session: session_at(Some("task-2"), "paused"),
        step: None,
    });
    let mut client = client(api.clone());

    client.start_session("inst-1", DebugMode::Step).await.unwrap();
    assert_eq!(client.highlighted_node_id(), Some("task-1"));

    client.step().await.unwrap();
    assert_eq!(client.highlighted_node_id(), Some("task-2"));
    assert_eq!(api.calls(), vec!["create_session inst-1 step", "step sess-1"]);
}

#[tokio::test]
async fn test_step_without_token_clears_highlight() {
    let api = Arc::new(MockDebug::default());
    api.steps.lock().unwrap().push_back(StepResult {
        session: session_at(None, "completed"),
        step: None,
    });
    let mut client = client(api);

    client.start_session("inst-1", DebugMode::Step).await.unwrap();
    client.step().await.unwrap();
    assert_eq!(client.highlighted_node_id(), None);
    assert_eq!(client.status(), Some(SessionStatus::Completed));
}

#[tokio::test]
async fn test_step_without_session_makes_no_call() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());

    let step = client.step().await.unwrap();
    assert!(step.is_none());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_step_surfaces_error() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    let result = client.step().await;
    assert!(matches!(result, Err(StudioError::ApiError { code: 409, .. })));
    assert!(client.error().is_some());
    assert_eq!(client.highlighted_node_id(), Some("task-1"));
}

#[tokio::test]
async fn test_resume_and_pause_are_optimistic() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    client.resume().await.unwrap();
    assert_eq!(client.status(), Some(SessionStatus::Running));

    client.pause().await.unwrap();
    assert_eq!(client.status(), Some(SessionStatus::Paused));
    assert_eq!(&api.calls()[1..], ["continue sess-1", "pause sess-1"]);
}

#[tokio::test]
async fn test_commands_need_a_session() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());

    assert!(matches!(client.resume().await, Err(StudioError::NoActiveSession)));
    assert!(matches!(client.stop().await, Err(StudioError::NoActiveSession)));
    assert!(matches!(
        client.add_breakpoint("task-1", None).await,
        Err(StudioError::NoActiveSession)
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_failed_stop_keeps_session() {
    let api = Arc::new(MockDebug {
        fail_stop: true,
        ..Default::default()
    });
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    assert!(client.stop().await.is_err());
    assert!(client.session().is_some());
    assert_eq!(client.error(), Some("HTTP status 502: bad gateway"));
}

#[tokio::test]
async fn test_successful_stop_clears_session() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    client.stop().await.unwrap();
    assert!(client.session().is_none());
    assert_eq!(client.highlighted_node_id(), None);
    assert!(!client.is_connected());

    // Disconnecting again is harmless
    client.disconnect().await;
}

#[tokio::test]
async fn test_malformed_frame_tolerated() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();
    let before = client.session().cloned();

    assert!(!client.handle_frame("{not json"));
    assert_eq!(client.session().cloned(), before);
    assert_eq!(client.state().event_count(), 0);

    assert!(client.handle_frame(
        r#"{"type":"node_entered","sessionId":"sess-1","payload":{"nodeId":"task-7"}}"#
    ));
    assert_eq!(client.highlighted_node_id(), Some("task-7"));
}

#[tokio::test]
async fn test_session_completed_is_idempotent() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    let frame = r#"{"type":"session_completed","sessionId":"sess-1","payload":{}}"#;
    client.handle_frame(frame);
    let once = (client.status(), client.highlighted_node_id().map(str::to_string));
    client.handle_frame(frame);
    let twice = (client.status(), client.highlighted_node_id().map(str::to_string));

    assert_eq!(once, (Some(SessionStatus::Completed), None));
    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_event_dispatch() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Breakpoint).await.unwrap();

    client.handle_frame(r#"{"type":"session_resumed","sessionId":"sess-1"}"#);
    assert_eq!(client.status(), Some(SessionStatus::Running));

    client.handle_frame(r#"{"type":"node_exited","payload":{"nodeId":"task-9"}}"#);
    assert_eq!(client.highlighted_node_id(), Some("task-1"));

    client.handle_frame(r#"{"type":"breakpoint_hit","payload":{"nodeId":"task-3"}}"#);
    assert_eq!(client.status(), Some(SessionStatus::Paused));
    assert_eq!(client.highlighted_node_id(), Some("task-3"));

    client.handle_frame(r#"{"type":"variable_changed","payload":{"key":"amount","value":42}}"#);
    assert_eq!(client.session().unwrap().variables.get("amount"), Some(&json!(42)));

    client.handle_frame(r#"{"type":"token_forked","payload":{}}"#);
    client.handle_frame(r#"{"type":"error","payload":{"message":"boom"}}"#);
    assert_eq!(client.status(), Some(SessionStatus::Error));
    assert_eq!(client.state().event_count(), 6);
}

#[tokio::test]
async fn test_toggle_is_local_add_remove_are_remote() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());
    client.start_session("inst-1", DebugMode::Breakpoint).await.unwrap();

    let added = client
        .add_breakpoint("task-2", Some("amount > 100".to_string()))
        .await
        .unwrap();
    assert!(added.enabled);
    let calls_after_add = api.calls().len();

    assert_eq!(client.toggle_breakpoint("task-2"), Some(false));
    assert_eq!(api.calls().len(), calls_after_add);
    let breakpoint = &client.session().unwrap().breakpoints["task-2"];
    assert!(!breakpoint.enabled);
    assert_eq!(breakpoint.condition.as_deref(), Some("amount > 100"));

    assert_eq!(client.toggle_breakpoint("task-404"), None);

    client.remove_breakpoint("task-2").await.unwrap();
    assert!(client.session().unwrap().breakpoints.is_empty());
    assert_eq!(api.calls().last().unwrap(), "remove_breakpoint sess-1 task-2");
}

#[tokio::test]
async fn test_variables_and_timeline() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    client.set_variable("approved", json!(true)).await.unwrap();
    let variables = client.get_variables().await.unwrap();
    assert_eq!(variables.get("approved"), Some(&json!(true)));
    assert_eq!(client.session().unwrap().variables, variables);

    let timeline = client.load_timeline().await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].node_id, "task-1");
}

#[tokio::test]
async fn test_launch_attach_and_list() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());

    let session = client
        .launch("def-1", serde_json::Map::new(), DebugMode::Continuous)
        .await
        .unwrap();
    assert_eq!(session.id, "sess-1");
    assert_eq!(
        &api.calls()[..2],
        ["create_instance def-1", "create_session inst-1 continuous"]
    );

    client.attach("sess-1").await.unwrap();
    assert_eq!(client.status(), Some(SessionStatus::Running));

    client.refresh().await.unwrap();
    assert_eq!(client.list_sessions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_connect_failure_is_recorded() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);

    let result = client.connect("sess-1").await;
    assert!(matches!(result, Err(StudioError::WebSocketError(_))));
    assert!(!client.is_connected());
    assert!(client.error().is_some());
}

#[tokio::test]
async fn test_switching_session_drops_previous_timeline() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api);

    client.attach("sess-A").await.unwrap();
    client.load_timeline().await.unwrap();
    assert_eq!(client.timeline().len(), 1);
    assert_eq!(client.session().unwrap().timeline, client.timeline());

    // Same session again keeps what was loaded
    client.refresh().await.unwrap();
    assert_eq!(client.timeline().len(), 1);

    client.attach("sess-B").await.unwrap();
    assert_eq!(client.session().unwrap().id, "sess-B");
    assert!(client.timeline().is_empty());
}

#[tokio::test]
async fn test_step_result_lands_on_session_timeline() {
    let api = Arc::new(MockDebug::default());
    let step: ExecutionStep = serde_json::from_value(json!({
        "id": 7,
        "stepIndex": 0,
        "timestamp": "2026-03-01T10:00:00Z",
        "nodeId": "task-1",
        "action": "exit"
    }))
    .unwrap();
    api.steps.lock().unwrap().push_back(StepResult {
        session: session_at(Some("task-2"), "paused"),
        step: Some(step),
    });
    let mut client = client(api);
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    client.step().await.unwrap();
    assert_eq!(client.timeline().len(), 1);
    assert_eq!(client.session().unwrap().timeline[0].id, 7);
}

#[tokio::test]
async fn test_resume_ack_and_event_converge_in_either_order() {
    let resumed = r#"{"type":"session_resumed","sessionId":"sess-1"}"#;

    let api = Arc::new(MockDebug::default());
    let mut ack_first = client(api);
    ack_first.start_session("inst-1", DebugMode::Step).await.unwrap();
    ack_first.resume().await.unwrap();
    ack_first.handle_frame(resumed);

    let api = Arc::new(MockDebug::default());
    let mut event_first = client(api);
    event_first.start_session("inst-1", DebugMode::Step).await.unwrap();
    event_first.handle_frame(resumed);
    event_first.resume().await.unwrap();

    assert_eq!(ack_first.status(), Some(SessionStatus::Running));
    assert_eq!(event_first.status(), Some(SessionStatus::Running));
    assert_eq!(ack_first.session(), event_first.session());
}

#[tokio::test]
async fn test_completion_before_resume_ack_stays_completed() {
    let api = Arc::new(MockDebug::default());
    let mut client = client(api.clone());
    client.start_session("inst-1", DebugMode::Step).await.unwrap();

    client.handle_frame(r#"{"type":"session_completed","sessionId":"sess-1"}"#);
    client.resume().await.unwrap();

    assert_eq!(client.status(), Some(SessionStatus::Completed));
    assert_eq!(client.highlighted_node_id(), None);
    assert_eq!(api.calls().last().unwrap(), "continue sess-1");
}

#[tokio::test]
async fn test_set_variable_and_push_event_converge() {
    let changed = r#"{"type":"variable_changed","sessionId":"sess-1","payload":{"key":"amount","value":250}}"#;

    let api = Arc::new(MockDebug::default());
    let mut ack_first = client(api);
    ack_first.start_session("inst-1", DebugMode::Step).await.unwrap();
    ack_first.set_variable("amount", json!(250)).await.unwrap();
    ack_first.handle_frame(changed);

    let api = Arc::new(MockDebug::default());
    let mut event_first = client(api);
    event_first.start_session("inst-1", DebugMode::Step).await.unwrap();
    event_first.handle_frame(changed);
    event_first.set_variable("amount", json!(250)).await.unwrap();

    let expected = HashMap::from([("amount".to_string(), json!(250))]);
    assert_eq!(ack_first.session().unwrap().variables, expected);
    assert_eq!(event_first.session().unwrap().variables, expected);
}
