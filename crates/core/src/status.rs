// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level `Status` document persisted as `status.json`.

use crate::plan::Plan;
use crate::task::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical execution episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: crate::id::RunId,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub tasks_failed: u32,
}

/// Cached per-status-category counts, auto-reconciled on every load/save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    pub in_progress: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Summary {
    /// Recompute from the authoritative task list. This is the only
    /// function allowed to produce a `Summary` value.
    pub fn compute(tasks: &[Task]) -> Self {
        let mut summary = Summary {
            total: tasks.len() as u32,
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// True if this summary matches what `tasks` actually contains.
    pub fn is_consistent_with(&self, tasks: &[Task]) -> bool {
        *self == Self::compute(tasks)
    }
}

/// The authoritative, mutable execution-state document for one plan.
/// Unknown fields round-trip through
/// `serde_json::Value` so future schema additions don't get dropped by an
/// older binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub plan_id: String,
    pub plan_path: std::path::PathBuf,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub current_phase: Option<String>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub runs: Vec<Run>,
    pub summary: Summary,
    /// Fields this binary doesn't know about, preserved verbatim on
    /// round-trip.
    #[serde(flatten)]
    pub unknown_fields: BTreeMap<String, serde_json::Value>,
}

impl Status {
    /// Build the initial status for a freshly parsed plan: every task
    /// `pending`, no runs.
    pub fn initialize(plan: &Plan, now: DateTime<Utc>) -> Self {
        let mut tasks: Vec<Task> = plan
            .tasks_in_order()
            .into_iter()
            .map(Task::new_pending)
            .collect();
        derive_dependents(&mut tasks);

        let current_phase = plan.phases.first().map(|p| format!("Phase {}: {}", p.number, p.title));

        Self {
            plan_id: plan.id.clone(),
            plan_path: plan.path.clone(),
            created_at: now,
            last_updated_at: now,
            current_phase,
            summary: Summary::compute(&tasks),
            tasks,
            runs: Vec::new(),
            unknown_fields: BTreeMap::new(),
        }
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// Recompute `summary` from `tasks` and bump `last_updated_at`. Called
    /// by every writer immediately before serialization.
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> bool {
        let fresh = Summary::compute(&self.tasks);
        let changed = fresh != self.summary;
        self.summary = fresh;
        self.last_updated_at = now;
        changed
    }
}

/// Recompute `dependents` for every task from the other tasks' `dependencies`.
pub fn derive_dependents(tasks: &mut [Task]) {
    let mut dependents: BTreeMap<TaskId, std::collections::BTreeSet<TaskId>> = BTreeMap::new();
    for task in tasks.iter() {
        for dep in &task.dependencies {
            dependents.entry(dep.clone()).or_default().insert(task.id.clone());
        }
    }
    for task in tasks.iter_mut() {
        task.dependents = dependents.remove(&task.id).unwrap_or_default();
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
