use super::*;
use crate::build_router;
use crate::state::AppState;
use crate::test_support::{sample_task, FakeControlPlane, FakePlan};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use conductor_core::TaskStatus;
use conductor_events::EventBus;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_plan() -> axum::Router {
    let plan = FakePlan {
        plan_id: "demo".to_string(),
        tasks: vec![sample_task("1.1", TaskStatus::Pending)],
        current_phase: Some("Phase 1: build".to_string()),
        findings: Vec::new(),
        log_lines: Vec::new(),
    };
    let control = Arc::new(FakeControlPlane::with_plan(plan));
    build_router(AppState::new(control, EventBus::default()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn start_succeeds_then_conflicts_on_a_second_call() {
    let app = app_with_plan();
    let body = serde_json::json!({"mode": "auto"});

    let first = app
        .clone()
        .oneshot(post("/api/plans/demo/start", body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post("/api/plans/demo/start", body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["code"], "ORCHESTRATOR_ALREADY_RUNNING");
}

#[tokio::test]
async fn stop_without_a_running_orchestrator_is_not_running() {
    let app = app_with_plan();
    let response = app
        .oneshot(post("/api/plans/demo/stop", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ORCHESTRATOR_NOT_RUNNING");
}

#[tokio::test]
async fn start_then_stop_round_trips() {
    let app = app_with_plan();
    let start = app
        .clone()
        .oneshot(post("/api/plans/demo/start", serde_json::json!({"mode": "auto"})))
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::CREATED);

    let stop = app
        .oneshot(post("/api/plans/demo/stop", serde_json::json!({"force": false})))
        .await
        .unwrap();
    assert_eq!(stop.status(), StatusCode::OK);
}

#[tokio::test]
async fn skip_task_on_an_unknown_plan_is_not_found() {
    let app = app_with_plan();
    let response = app
        .oneshot(post(
            "/api/plans/nope/tasks/1.1/skip",
            serde_json::json!({"reason": "manual override"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
