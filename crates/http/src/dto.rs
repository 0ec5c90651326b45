// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response/request bodies for the REST surface. snake_case throughout,
//! timestamps RFC 3339 UTC (via `conductor_core::Status`'s own `chrono`
//! serialization).

use conductor_core::{Summary, Task, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub current_phase: Option<String>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDetail {
    pub plan_id: String,
    pub plan_path: std::path::PathBuf,
    pub current_phase: Option<String>,
    pub summary: Summary,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanStatusLight {
    pub plan_id: String,
    pub current_phase: Option<String>,
    pub summary: Summary,
    pub active_tasks: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub task_id: TaskId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsPage {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    pub lines: Option<usize>,
    #[serde(default)]
    pub follow: bool,
    #[serde(default)]
    pub since: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    pub mode: String,
    #[serde(default)]
    pub tasks: Option<Vec<TaskId>>,
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StopRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkipRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceEntry {
    pub id: String,
    pub path: std::path::PathBuf,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorktreeEntry {
    pub id: String,
    pub path: std::path::PathBuf,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
}
