// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load, save, and recover `status.json`, and the mutations applied to it
//! while a plan runs.

use crate::error::StatusError;
use chrono::{DateTime, Utc};
use conductor_core::{
    is_allowed_transition, Plan, Run, RunId, Status, Task, TaskId, TaskStatus, STUCK_THRESHOLD_MS,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn status_path(plan_dir: &Path) -> PathBuf {
    plan_dir.join("status.json")
}

pub fn lock_path(plan_dir: &Path) -> PathBuf {
    plan_dir.join("status.lock")
}

/// Which of the three recovery steps produced the returned status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// `status.json` decoded and matched the plan; no recovery needed.
    Primary,
    /// `status.json` was missing or corrupt; `.bak` decoded and matched.
    Backup,
    /// Primary and backup were both unusable; rebuilt fresh from the plan.
    /// Whatever completion history existed is lost.
    RebuiltFromPlan,
}

/// True if `status`'s task set is exactly the plan's task set. A mismatch
/// means the plan was edited since the status was last written and the
/// document can't be trusted as-is.
fn matches_plan(status: &Status, plan: &Plan) -> bool {
    if status.tasks.len() != plan.tasks.len() {
        return false;
    }
    status.tasks.iter().all(|t| plan.tasks.contains_key(&t.id))
}

/// Build the initial `pending`-everywhere status for a freshly parsed plan
/// and persist it.
pub fn initialize(path: &Path, plan: &Plan, now: DateTime<Utc>) -> Result<Status, StatusError> {
    let status = Status::initialize(plan, now);
    conductor_store::write_atomic(path, &status)?;
    Ok(status)
}

/// Load `status.json`, recovering from `.bak` or rebuilding from `plan` if
/// the primary document is missing, corrupt, or stale relative to `plan`.
///
/// Three-step sequence: decode and validate the primary; if that fails,
/// decode and validate the backup; if that also fails, rebuild fresh from
/// `plan`. The caller is told which source won so it can emit the matching
/// recovery event.
pub fn load_or_recover(
    path: &Path,
    plan: &Plan,
    now: DateTime<Utc>,
) -> Result<(Status, RecoverySource), StatusError> {
    if let Some(mut status) = conductor_store::read_json_or_quarantine::<Status>(path)? {
        if matches_plan(&status, plan) {
            status.reconcile(now);
            return Ok((status, RecoverySource::Primary));
        }
        warn!(path = %path.display(), "status.json task set no longer matches plan, falling back to backup");
    }

    if let Some(mut status) = conductor_store::restore_from_backup::<Status>(path)? {
        if matches_plan(&status, plan) {
            warn!(path = %path.display(), "recovered status from .bak");
            status.reconcile(now);
            conductor_store::write_atomic(path, &status)?;
            return Ok((status, RecoverySource::Backup));
        }
        warn!(path = %path.display(), ".bak task set also doesn't match plan, rebuilding");
    }

    info!(path = %path.display(), "rebuilding status from plan, execution history is lost");
    let status = Status::initialize(plan, now);
    conductor_store::write_atomic(path, &status)?;
    Ok((status, RecoverySource::RebuiltFromPlan))
}

/// Back up the current file, reconcile the summary, then write atomically.
pub fn save(path: &Path, status: &mut Status, now: DateTime<Utc>) -> Result<(), StatusError> {
    conductor_store::backup(path)?;
    status.reconcile(now);
    conductor_store::write_atomic(path, status)?;
    Ok(())
}

/// Apply a task status transition, updating timing and error fields.
/// Rejects transitions not in [`is_allowed_transition`].
pub fn update_task(
    status: &mut Status,
    task_id: &TaskId,
    to: TaskStatus,
    now: DateTime<Utc>,
    error: Option<String>,
) -> Result<(), StatusError> {
    let task = status
        .tasks
        .iter_mut()
        .find(|t| &t.id == task_id)
        .ok_or_else(|| StatusError::UnknownTask {
            task_id: task_id.clone(),
        })?;

    if !is_allowed_transition(task.status, to) {
        return Err(StatusError::InvalidTransition {
            task_id: task_id.clone(),
            from: task.status,
            to,
        });
    }

    apply_transition(task, to, now, error);
    Ok(())
}

fn apply_transition(task: &mut Task, to: TaskStatus, now: DateTime<Utc>, error: Option<String>) {
    match to {
        TaskStatus::InProgress => {
            task.started_at = Some(now);
            task.completed_at = None;
            task.stuck_detected = false;
        }
        TaskStatus::Completed => {
            task.completed_at = Some(now);
            task.duration_ms = duration_ms(task.started_at, now);
            task.last_error = None;
            task.last_error_at = None;
        }
        TaskStatus::Failed => {
            task.completed_at = Some(now);
            task.duration_ms = duration_ms(task.started_at, now);
            task.last_error = error;
            task.last_error_at = Some(now);
        }
        TaskStatus::Skipped => {
            task.completed_at = Some(now);
        }
        TaskStatus::Pending => {
            // Retry: clear per-attempt fields, bump the counter.
            task.retry_count += 1;
            task.started_at = None;
            task.completed_at = None;
            task.duration_ms = None;
            task.stuck_detected = false;
        }
    }
    task.status = to;
}

fn duration_ms(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<u64> {
    started_at.map(|start| (now - start).num_milliseconds().max(0) as u64)
}

/// Start a new run, appending it to `status.runs`.
pub fn start_run(status: &mut Status, run_id: RunId, now: DateTime<Utc>) {
    status.runs.push(Run {
        run_id,
        started_at: now,
        completed_at: None,
        tasks_completed: 0,
        tasks_failed: 0,
    });
}

/// Close out the most recently started run with final counts drawn from
/// the current summary.
pub fn complete_run(status: &mut Status, run_id: &RunId, now: DateTime<Utc>) {
    if let Some(run) = status.runs.iter_mut().find(|r| &r.run_id == run_id) {
        run.completed_at = Some(now);
        run.tasks_completed = status.summary.completed;
        run.tasks_failed = status.summary.failed;
    }
}

/// Transition any task that has been `in_progress` longer than
/// [`STUCK_THRESHOLD_MS`] to `failed`, marking it `stuck_detected`. Returns
/// the ids of tasks that were swept.
pub fn sweep_stuck(status: &mut Status, now: DateTime<Utc>) -> Vec<TaskId> {
    sweep_stuck_with_threshold(status, now, STUCK_THRESHOLD_MS)
}

pub fn sweep_stuck_with_threshold(
    status: &mut Status,
    now: DateTime<Utc>,
    threshold_ms: i64,
) -> Vec<TaskId> {
    let mut swept = Vec::new();
    for task in status.tasks.iter_mut() {
        if task.status != TaskStatus::InProgress {
            continue;
        }
        let Some(started_at) = task.started_at else {
            continue;
        };
        if (now - started_at).num_milliseconds() >= threshold_ms {
            task.status = TaskStatus::Failed;
            task.stuck_detected = true;
            task.completed_at = Some(now);
            task.duration_ms = duration_ms(Some(started_at), now);
            task.last_error = Some("stuck_timeout".to_string());
            task.last_error_at = Some(now);
            swept.push(task.id.clone());
        }
    }
    swept
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
