// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dto::{Finding, LogsPage, LogsQuery, PlanDetail, PlanStatusLight, PlanSummary, TaskList};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use conductor_core::TaskId;

pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<PlanSummary>> {
    Json(state.control.list_plans().await)
}

pub async fn plan_detail(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanDetail>, ApiError> {
    state
        .control
        .plan_detail(&plan_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::plan_not_found(&plan_id))
}

pub async fn plan_status(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanStatusLight>, ApiError> {
    state
        .control
        .plan_status(&plan_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::plan_not_found(&plan_id))
}

pub async fn plan_tasks(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Result<Json<TaskList>, ApiError> {
    state
        .control
        .plan_tasks(&plan_id)
        .await
        .map(|tasks| Json(TaskList { tasks }))
        .ok_or_else(|| ApiError::plan_not_found(&plan_id))
}

pub async fn finding(
    State(state): State<AppState>,
    Path((plan_id, task_id)): Path<(String, String)>,
) -> Result<Json<Finding>, ApiError> {
    let task_id = TaskId::new(task_id);
    state
        .control
        .finding(&plan_id, &task_id)
        .await
        .map(|content| Json(Finding { task_id, content }))
        .ok_or_else(|| ApiError::plan_not_found(&plan_id))
}

const DEFAULT_LOG_LINES: usize = 200;

pub async fn logs(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsPage>, ApiError> {
    let lines = query.lines.unwrap_or(DEFAULT_LOG_LINES);
    state
        .control
        .logs(&plan_id, lines)
        .await
        .map(|content| Json(LogsPage { content }))
        .ok_or_else(|| ApiError::plan_not_found(&plan_id))
}

#[cfg(test)]
#[path = "plans_tests.rs"]
mod tests;
