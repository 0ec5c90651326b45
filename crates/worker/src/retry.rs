// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry eligibility and the skip cascade applied to a failed task's
//! transitive dependents.

use conductor_core::{Status, TaskId, TaskStatus};
use std::collections::{BTreeSet, VecDeque};

/// True if `task_id` should be retried automatically rather than cascading
/// a skip to its dependents.
pub fn is_retry_eligible(status: &Status, task_id: &TaskId) -> bool {
    status.task(task_id).map(|t| t.retry_eligible()).unwrap_or(false)
}

/// Every task transitively reachable from `task_id` via `dependents`, in
/// breadth-first order, that is still pending and therefore a candidate to
/// be marked `skipped`. `task_id` itself is not included.
///
/// Tasks already terminal (completed, failed, or skipped) are not
/// revisited, so a diamond-shaped dependency graph is only ever walked
/// once per task.
pub fn skip_cascade(status: &Status, task_id: &TaskId) -> Vec<TaskId> {
    let mut seen: BTreeSet<TaskId> = BTreeSet::new();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    let mut cascade = Vec::new();

    if let Some(task) = status.task(task_id) {
        queue.extend(task.dependents.iter().cloned());
    }

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let Some(task) = status.task(&id) else {
            continue;
        };
        if task.status != TaskStatus::Pending {
            continue;
        }
        cascade.push(id.clone());
        queue.extend(task.dependents.iter().cloned());
    }

    cascade
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
