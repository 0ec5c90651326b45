// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dto::{SkipRequest, StartRequest, StopRequest};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use conductor_core::TaskId;
use serde_json::json;

pub async fn start(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Json(req): Json<StartRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    state.control.start(&plan_id, req).await?;
    Ok((StatusCode::CREATED, Json(json!({"success": true}))))
}

pub async fn stop(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Json(body): Json<StopRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.control.stop(&plan_id, body.force).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn pause(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.control.pause(&plan_id).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn resume(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.control.resume(&plan_id).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn skip_task(
    State(state): State<AppState>,
    Path((plan_id, task_id)): Path<(String, String)>,
    Json(req): Json<SkipRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task_id = TaskId::new(task_id);
    state.control.skip_task(&plan_id, &task_id, req.reason).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn retry_task(
    State(state): State<AppState>,
    Path((plan_id, task_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task_id = TaskId::new(task_id);
    state.control.retry_task(&plan_id, &task_id).await?;
    Ok(Json(json!({"success": true})))
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
