//! Integration tests for the HTTP API
//!
//! Each test drives one router instance through `oneshot` calls; the router
//! shares its session maps across clones.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use decisim::config::SimConfig;
use decisim::core::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_router() -> Router {
    create_router(SimConfig::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router();
    let (status, json) = call(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions_active"], 0);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_gesture_flow() {
    let app = create_test_router();
    let (status, created) = call(&app, "POST", "/gesture/new", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["session_id"].as_str().unwrap().to_string();
    assert_eq!(created["websocket_url"], format!("/ws/{}", id));

    let events = [("pointerdown", 0.74, 0.62), ("pointermove", 0.40, 0.40), ("pointerup", 0.12, 0.20)];
    let mut last = Value::Null;
    for (kind, x, y) in events {
        let body = json!({ "kind": kind, "x": x, "y": y, "pointerId": 1 });
        let (status, json) = call(&app, "POST", &format!("/gesture/{}/event", id), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["accepted"], true);
        last = json;
    }
    assert_eq!(last["reason"], "R004_GESTURE_COMMITTED");
    assert_eq!(last["follow_up"], "R007_OUTCOME_RESOLVED");
    assert_eq!(last["view"]["phase"], "resolved");
    assert_eq!(last["view"]["breakdown"]["winner"], "A");

    let (status, trace) = call(&app, "GET", &format!("/gesture/{}/trace", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trace["version"], "decisim.trace.v1");
    assert_eq!(trace["events"].as_array().unwrap().len(), 3);

    let (status, verified) = call(&app, "POST", "/replay/verify", Some(trace.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verified["ok"], true);
    assert_eq!(verified["duplicate"], false);

    let (_, again) = call(&app, "POST", "/replay/verify", Some(trace)).await;
    assert_eq!(again["duplicate"], true);

    let (_, health) = call(&app, "GET", "/health", None).await;
    assert_eq!(health["sessions_active"], 1);
    assert_eq!(health["replays_loaded"], 1);
}

#[tokio::test]
async fn test_ladder_flow() {
    let app = create_test_router();
    let (status, created) =
        call(&app, "POST", "/ladder/new", Some(json!({ "routeId": "proof-first" }))).await;
    assert_eq!(status, StatusCode::OK);
    let id = created["session_id"].as_str().unwrap().to_string();
    let uri = format!("/ladder/{}/action", id);

    for step in ["benchmark", "pilot", "audit"] {
        let (_, json) = call(&app, "POST", &uri, Some(json!({ "type": "CONFIRM_STEP", "stepId": step }))).await;
        assert_eq!(json["accepted"], true);
        assert_eq!(json["reason"], "R014_STEP_REVEALED");
    }
    let (_, sealed) = call(&app, "POST", &uri, Some(json!({ "type": "COMMIT_SEAL" }))).await;
    assert_eq!(sealed["accepted"], true);
    assert_eq!(sealed["view"]["stage"], "sealed");
    assert_eq!(sealed["view"]["confidence"], 100);

    let (status, view) = call(&app, "GET", &format!("/ladder/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["replay"]["captured"], 4);

    let (status, payload) = call(&app, "GET", &format!("/ladder/{}/replay", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["expectedSealLevel"], "sealed");

    let (_, verified) = call(&app, "POST", "/replay/verify", Some(payload)).await;
    assert_eq!(verified["ok"], true);
}

#[tokio::test]
async fn test_ladder_rejection_is_not_an_http_error() {
    let app = create_test_router();
    let (_, created) = call(&app, "POST", "/ladder/new", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();

    let (status, json) = call(
        &app,
        "POST",
        &format!("/ladder/{}/action", id),
        Some(json!({ "type": "CONFIRM_STEP", "stepId": "audit" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["accepted"], false);
    assert_eq!(json["reason"], "R106_STEP_OUT_OF_ORDER");
}

#[tokio::test]
async fn test_bad_requests() {
    let app = create_test_router();

    let (status, _) = call(&app, "POST", "/ladder/new", Some(json!({ "routeId": "moonshot" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = call(&app, "POST", "/ladder/new", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, "POST", &format!("/ladder/{}/action", id), Some(json!({ "type": "CONFIRM_STEP" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, created) = call(&app, "POST", "/gesture/new", None).await;
    let id = created["session_id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, "POST", &format!("/gesture/{}/event", id), Some(json!({ "kind": "wheel" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = create_test_router();
    let (status, _) = call(&app, "GET", "/gesture/gesture_ffff", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "GET", "/ladder/ladder_ffff/replay", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_reports_malformed_payload() {
    let app = create_test_router();
    let (status, json) = call(&app, "POST", "/replay/verify", Some(json!({ "version": "decisim.trace.v1" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["duplicate"], false);
}
