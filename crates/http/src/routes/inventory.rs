// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dto::{ResourceEntry, WorktreeEntry};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn resources(State(state): State<AppState>) -> Json<Vec<ResourceEntry>> {
    Json(state.control.resources().await)
}

pub async fn worktrees(State(state): State<AppState>) -> Json<Vec<WorktreeEntry>> {
    Json(state.control.worktrees().await)
}
