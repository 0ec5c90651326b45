// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task identifier and execution state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

crate::define_id! {
    /// Dotted `<phase>.<index>` task identifier, e.g. `"2.3"`.
    pub struct TaskId;
}

/// Execution status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Dependencies are satisfied by a dependency in either of these states.
    pub fn satisfies_dependency(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skipped)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Maximum number of automatic retries after a `failed` transition.
pub const MAX_RETRIES: u32 = 2;

/// Default per-task execution deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default stuck-detection threshold in milliseconds.
pub const STUCK_THRESHOLD_MS: i64 = 30 * 60 * 1000;

/// Default maximum parallel workers.
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Structural definition of a task, derived from the parsed plan and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDef {
    pub id: TaskId,
    pub phase_number: u32,
    pub description: String,
    #[serde(default)]
    pub dependencies: BTreeSet<TaskId>,
    #[serde(default)]
    pub file_refs: BTreeSet<String>,
    #[serde(default)]
    pub is_verify: bool,
}

/// A task's mutable execution record, as persisted in `status.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub phase_number: u32,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub last_error_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stuck_detected: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeSet<TaskId>,
    /// Derived: the set of tasks that depend on this one.
    #[serde(default)]
    pub dependents: BTreeSet<TaskId>,
    /// Structural-only, not in the wire schema, but useful to scheduling;
    /// kept out of serialization so `status.json` matches the wire schema
    /// exactly.
    #[serde(skip)]
    pub file_refs: BTreeSet<String>,
    #[serde(skip)]
    pub is_verify: bool,
}

impl Task {
    /// Build the initial, `pending` execution record for a structural task
    /// definition (used by `Status::initialize`).
    pub fn new_pending(def: &TaskDef) -> Self {
        Self {
            id: def.id.clone(),
            phase_number: def.phase_number,
            description: def.description.clone(),
            status: TaskStatus::Pending,
            started_at: None,
            completed_at: None,
            duration_ms: None,
            retry_count: 0,
            last_error: None,
            last_error_at: None,
            stuck_detected: false,
            notes: None,
            dependencies: def.dependencies.clone(),
            dependents: BTreeSet::new(),
            file_refs: def.file_refs.clone(),
            is_verify: def.is_verify,
        }
    }

    /// True if this task is eligible for an automatic retry.
    pub fn retry_eligible(&self) -> bool {
        self.status == TaskStatus::Failed && self.retry_count < MAX_RETRIES && !self.stuck_detected
    }

    /// True once the task can no longer change state on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

/// The handful of status transitions `UpdateTask` is allowed to apply.
/// Anything else is rejected as `InvalidTransition`.
pub fn is_allowed_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    if from == to {
        // Idempotent no-op transitions.
        return true;
    }
    matches!(
        (from, to),
        (Pending, InProgress)
            | (Pending, Skipped)
            | (InProgress, Completed)
            | (InProgress, Failed)
            | (Failed, Pending) // retry
    )
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
