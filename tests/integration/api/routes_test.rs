//! REST route integration tests

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskboard::backend::routes::api_routes::ChannelInfo;
use taskboard::backend::server::{create_app, ServerConfig};
use taskboard::shared::{BoardId, BoardSnapshot};
use tower::ServiceExt;

async fn app() -> Router {
    create_app(ServerConfig::default()).await
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = assert_ok!(app.clone().oneshot(request).await);
    let status = response.status();
    let bytes = assert_ok!(to_bytes(response.into_body(), usize::MAX).await);
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    assert_ok!(Request::builder().uri(uri).body(Body::empty()))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    assert_ok!(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string())))
}

async fn create_board(app: &Router, body: Value) -> BoardId {
    let (status, created) = call(app, post_json("/api/boards", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    BoardId::new(created["id"].as_str().unwrap_or_default())
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = call(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_new_board_has_empty_snapshot() {
    let app = app().await;
    let board_id = create_board(&app, json!({ "name": "Launch" })).await;

    let (status, body) = call(&app, get(&format!("/api/boards/{}/snapshot", board_id))).await;

    assert_eq!(status, StatusCode::OK);
    let snapshot: BoardSnapshot = assert_ok!(serde_json::from_value(body));
    assert_eq!(snapshot, BoardSnapshot::empty(board_id));
}

#[tokio::test]
async fn test_unknown_board_is_not_found() {
    let app = app().await;
    let (status, body) = call(&app, get("/api/boards/nope/snapshot")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_contains!(body["error"].as_str().unwrap_or_default(), "not found");
}

#[tokio::test]
async fn test_private_board_requires_member() {
    let app = app().await;
    let board_id = create_board(&app, json!({ "name": "Secret", "members": ["alice"] })).await;
    let uri = format!("/api/boards/{}/snapshot", board_id);

    let (status, body) = call(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);

    let as_alice = assert_ok!(Request::builder()
        .uri(&uri)
        .header("x-user-id", "alice")
        .body(Body::empty()));
    let (status, _) = call(&app, as_alice).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, get(&format!("{}?user=alice", uri))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blank_board_name_is_rejected() {
    let app = app().await;
    let (status, body) = call(&app, post_json("/api/boards", json!({ "name": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_channel_introspection() {
    let app = app().await;
    let board_id = create_board(&app, json!({ "name": "Quiet" })).await;

    let (status, body) = call(&app, get(&format!("/api/boards/{}/channel", board_id))).await;

    assert_eq!(status, StatusCode::OK);
    let info: ChannelInfo = assert_ok!(serde_json::from_value(body));
    assert_eq!(
        info,
        ChannelInfo {
            board_id,
            subscribers: 0
        }
    );
}

#[tokio::test]
async fn test_unknown_route_falls_back_to_404() {
    let app = app().await;
    let (status, _) = call(&app, get("/api/missing")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
