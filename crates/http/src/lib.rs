// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Localhost-only push server: a REST surface over [`ControlPlane`] plus
//! WebSocket/SSE fan-out of bus events. Bind to loopback only; nothing here
//! adds authentication.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod control;
mod dto;
mod error;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

pub use control::{ControlError, ControlPlane};
pub use dto::{
    Finding, Health, LogsPage, LogsQuery, PlanDetail, PlanStatusLight, PlanSummary, ResourceEntry,
    SkipRequest, StartRequest, StopRequest, TaskList, WorktreeEntry,
};
pub use error::{ApiError, ErrorCode};
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Assemble the router. Exposed separately from [`run_server`] so tests can
/// drive it with `tower::ServiceExt::oneshot` instead of a real listener.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/plans", get(routes::plans::list_plans))
        .route("/api/plans/{id}", get(routes::plans::plan_detail))
        .route("/api/plans/{id}/status", get(routes::plans::plan_status))
        .route("/api/plans/{id}/tasks", get(routes::plans::plan_tasks))
        .route(
            "/api/plans/{id}/findings/{task_id}",
            get(routes::plans::finding),
        )
        .route("/api/plans/{id}/logs", get(routes::plans::logs))
        .route("/api/plans/{id}/logs-sse", get(routes::realtime::logs_sse))
        .route(
            "/api/plans/{id}/events-sse",
            get(routes::realtime::events_sse),
        )
        .route("/api/plans/{id}/start", post(routes::control::start))
        .route("/api/plans/{id}/stop", post(routes::control::stop))
        .route("/api/plans/{id}/pause", post(routes::control::pause))
        .route("/api/plans/{id}/resume", post(routes::control::resume))
        .route(
            "/api/plans/{id}/tasks/{task_id}/skip",
            post(routes::control::skip_task),
        )
        .route(
            "/api/plans/{id}/tasks/{task_id}/retry",
            post(routes::control::retry_task),
        )
        .route("/api/resources", get(routes::inventory::resources))
        .route("/api/worktrees", get(routes::inventory::worktrees))
        .route("/ws/plans/{id}", get(routes::realtime::ws_plan))
        .route("/ws/all", get(routes::realtime::ws_all))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until a Ctrl+C or the given shutdown future resolves.
pub async fn run_server(
    control: Arc<dyn ControlPlane>,
    events: conductor_events::EventBus,
    bind: &str,
    port: u16,
) -> std::io::Result<()> {
    let state = AppState::new(control, events);
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    tracing::info!(%addr, "push server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("push server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
