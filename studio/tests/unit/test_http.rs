//! HTTP client tests against a stub backend

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use flowstudio::app::options::ClientOptions;
use flowstudio::errors::StudioError;
use flowstudio::http::{ControlCommand, DebugApi, DesignerApi, HttpClient, TagApi};
use flowstudio::models::design::Position;
use flowstudio::tags::TagCondition;

#[derive(Default)]
struct Captured {
    headers: Mutex<Option<HeaderMap>>,
    body: Mutex<Option<Value>>,
    removed: Mutex<Vec<(String, String, String)>>,
}

type Shared = Arc<Captured>;

async fn templates() -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "ok",
        "data": [{"type": "start", "name": "Start", "category": "control"}]
    }))
}

async fn get_draft(Path(id): Path<String>) -> Json<Value> {
    if id == "missing" {
        return Json(json!({"code": 404, "message": "not found", "error": "no such draft"}));
    }
    Json(json!({
        "code": 0,
        "data": {
            "id": id,
            "name": "Approval Flow",
            "nodes": [{"id": "start-1", "type": "start", "name": "Start",
                       "position": {"x": 10, "y": 20}}]
        }
    }))
}

async fn put_draft(
    State(captured): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    *captured.headers.lock().unwrap() = Some(headers);
    *captured.body.lock().unwrap() = Some(body.clone());
    Json(json!({"code": 0, "data": body}))
}

async fn export_draft() -> impl IntoResponse {
    (StatusCode::OK, b"{\"raw\":true}".to_vec())
}

async fn continue_session() -> Json<Value> {
    Json(json!({"code": 0, "message": "continued"}))
}

async fn delete_definition() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn query(State(captured): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    *captured.body.lock().unwrap() = Some(body);
    Json(json!({
        "code": 0,
        "data": {"results": [{"userId": "u1", "username": "ada"}], "total": 1, "page": 1, "limit": 20}
    }))
}

async fn remove_tag(
    State(captured): State<Shared>,
    Path((user_id, tag_name)): Path<(String, String)>,
    uri: Uri,
) -> Json<Value> {
    captured
        .removed
        .lock()
        .unwrap()
        .push((uri.path().to_string(), user_id, tag_name));
    Json(json!({"code": 0}))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"code": 0, "data": []}))
}

async fn spawn_backend() -> (SocketAddr, Shared) {
    let captured: Shared = Arc::new(Captured::default());
    let app = Router::new()
        .route("/api/designer/templates", get(templates))
        .route("/api/designer/drafts/{id}", get(get_draft).put(put_draft))
        .route("/api/designer/drafts/{id}/export", get(export_draft))
        .route("/api/debug/sessions", get(slow))
        .route("/api/debug/sessions/{id}/continue", post(continue_session))
        .route("/api/tags/definitions/{id}", delete(delete_definition))
        .route("/api/tags/query", post(query))
        .route("/api/users/{user_id}/tags/{tag_name}", delete(remove_tag))
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

fn client(addr: SocketAddr, timeout: Duration) -> HttpClient {
    HttpClient::new(&ClientOptions {
        base_url: format!("http://{}/api/", addr),
        request_timeout: timeout,
        token: Some(SecretString::from("t0ken".to_string())),
        impersonate_user: Some("u-9".to_string()),
    })
    .unwrap()
}

#[tokio::test]
async fn test_envelope_unwrapping() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    let templates = assert_ok!(client.get_templates().await);
    assert_eq!(templates.len(), 1);

    let draft = assert_ok!(client.get_draft("d1").await);
    assert_eq!(draft.node("start-1").unwrap().position, Position::new(10.0, 20.0));
}

#[tokio::test]
async fn test_application_error_code() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.get_draft("missing").await);
    match err {
        StudioError::ApiError { code, message } => {
            assert_eq!(code, 404);
            assert_eq!(message, "not found: no such draft");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_headers_and_body_on_save() {
    let (addr, captured) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    let design = client.get_draft("d1").await.unwrap();
    let saved = client.update_draft("d1", &design).await.unwrap();
    assert_eq!(saved, design);

    let headers = captured.headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers.get("authorization").unwrap(), "Bearer t0ken");
    assert_eq!(headers.get("x-impersonate-user").unwrap(), "u-9");
    assert_eq!(headers.get("x-request-id").unwrap().len(), 36);

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["nodes"][0]["type"], "start");
}

#[tokio::test]
async fn test_command_without_data() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));
    assert_ok!(client.control("s1", ControlCommand::Continue).await);
}

#[tokio::test]
async fn test_plain_http_failure() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.delete_definition("tag-1").await);
    assert!(matches!(err, StudioError::StatusError { status: 500, ref body } if body == "boom"));
}

#[tokio::test]
async fn test_export_is_raw() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));
    let bytes = client.export_draft("d1").await.unwrap();
    assert_eq!(bytes, b"{\"raw\":true}");
}

#[tokio::test]
async fn test_tag_query_body() {
    let (addr, captured) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    let condition = TagCondition::equals("region", "emea");
    let result = client.query_by_tags(&condition, 2, 10).await.unwrap();
    assert_eq!(result.results[0].username.as_deref(), Some("ada"));

    let body = captured.body.lock().unwrap().clone().unwrap();
    assert_eq!(
        body,
        json!({
            "condition": {"tag": "region", "operator": "eq", "value": "emea"},
            "page": 2,
            "limit": 10
        })
    );
}

#[tokio::test]
async fn test_request_timeout() {
    let (addr, _) = spawn_backend().await;
    let client = client(addr, Duration::from_millis(200));

    let err = assert_err!(client.list_sessions().await);
    match err {
        StudioError::HttpError(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_tag_names_are_escaped_in_paths() {
    let (addr, captured) = spawn_backend().await;
    let client = client(addr, Duration::from_secs(5));

    assert_ok!(client.remove_tag("u1", "cost#center").await);
    assert_ok!(client.remove_tag("u1", "team/lead").await);

    let removed = captured.removed.lock().unwrap().clone();
    assert_eq!(
        removed,
        vec![
            (
                "/api/users/u1/tags/cost%23center".to_string(),
                "u1".to_string(),
                "cost#center".to_string()
            ),
            (
                "/api/users/u1/tags/team%2Flead".to_string(),
                "u1".to_string(),
                "team/lead".to_string()
            ),
        ]
    );
}
