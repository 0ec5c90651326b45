// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Picks the next batch of tasks to run: dependency-ready,
//! `[SEQUENTIAL]`-constrained, file-conflict-free, and capped in size.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use conductor_core::{Plan, Status, TaskDef, TaskId, TaskStatus, DEFAULT_MAX_PARALLEL};
use std::collections::HashSet;

/// Default cap on a single [`next_batch`] call, independent of
/// `max_parallel`.
pub const DEFAULT_MAX_BATCH: usize = 5;

/// Tuning for [`next_batch`].
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Upper bound on tasks in flight at once, across all batches.
    pub max_parallel: usize,
    /// Upper bound on the size of a single batch.
    pub max_batch: usize,
    /// When set, a phase is only reachable once every earlier phase (other
    /// than its declared `[PARALLEL]` siblings) is cleared. When unset, a
    /// task's own dependencies and its phase's `pipeline-start` trigger (if
    /// any) are the only phase-shaped gates; the phase number otherwise only
    /// breaks ties in ordering.
    pub phase_priority: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            max_batch: DEFAULT_MAX_BATCH,
            phase_priority: false,
        }
    }
}

/// True if every task in `phase_number` is terminal, where a VERIFY task in
/// a phase annotated non-blocking doesn't have to be: it's allowed to still
/// be pending, in progress, or even failed without holding the plan open.
fn phase_cleared(plan: &Plan, status: &Status, phase_number: u32) -> bool {
    let non_blocking = plan.annotations.is_non_blocking_verify(phase_number);
    plan.tasks
        .values()
        .filter(|def| def.phase_number == phase_number)
        .all(|def| {
            if non_blocking && def.is_verify {
                return true;
            }
            status
                .task(&def.id)
                .map(|t| t.is_terminal())
                .unwrap_or(false)
        })
}

/// The other phase numbers declared `[PARALLEL]` alongside `phase_number`,
/// if any. Advisory in general, but under `phase_priority` it exempts those
/// phases from the "every earlier phase cleared" restriction.
fn parallel_siblings(plan: &Plan, phase_number: u32) -> HashSet<u32> {
    plan.annotations
        .parallel_phases
        .iter()
        .find(|group| group.phases.contains(&phase_number))
        .map(|group| group.phases.iter().copied().collect())
        .unwrap_or_default()
}

/// True if `phase_number` is reachable for scheduling purposes.
///
/// A phase's own `pipeline-start` trigger, if declared, always gates it:
/// unreachable until the trigger task completes (or is skipped), regardless
/// of `phase_priority`. Beyond that, `phase_priority` selects between two
/// readiness models: off, phase number never gates a task beyond its own
/// trigger (ordering falls out of dependencies and `[SEQUENTIAL]` groups
/// alone); on, a phase additionally stays closed until every earlier phase
/// — other than its declared `[PARALLEL]` siblings — is cleared.
fn phase_reachable(plan: &Plan, status: &Status, phase_number: u32, phase_priority: bool) -> bool {
    if let Some(trigger) = plan.annotations.trigger_for_phase(phase_number) {
        if status
            .task(trigger)
            .map(|t| t.status.satisfies_dependency())
            .unwrap_or(false)
        {
            return true;
        }
        if !phase_priority {
            return false;
        }
    }

    if !phase_priority {
        return true;
    }

    let siblings = parallel_siblings(plan, phase_number);
    plan.phases
        .iter()
        .filter(|p| p.number < phase_number && !siblings.contains(&p.number))
        .all(|p| phase_cleared(plan, status, p.number))
}

/// True if every dependency of `def` is completed or skipped.
fn dependencies_satisfied(def: &TaskDef, status: &Status) -> bool {
    def.dependencies.iter().all(|dep| {
        status
            .task(dep)
            .map(|t| t.status.satisfies_dependency())
            .unwrap_or(false)
    })
}

/// True if `def` is blocked by its `[SEQUENTIAL]` group: some group member
/// with a lower id hasn't completed or been skipped yet.
fn sequential_blocked(plan: &Plan, status: &Status, def: &TaskDef) -> bool {
    let Some(group) = plan.annotations.group_for(&def.id) else {
        return false;
    };
    group
        .task_ids
        .iter()
        .take_while(|id| *id != &def.id)
        .any(|id| {
            !status
                .task(id)
                .map(|t| t.status.satisfies_dependency())
                .unwrap_or(false)
        })
}

/// A task is ready when it's pending, its phase is reachable, its
/// dependencies are satisfied, and it isn't blocked behind an earlier
/// sequential-group member.
fn is_ready(plan: &Plan, status: &Status, def: &TaskDef, options: &SchedulerOptions) -> bool {
    let Some(task) = status.task(&def.id) else {
        return false;
    };
    task.status == TaskStatus::Pending
        && phase_reachable(plan, status, def.phase_number, options.phase_priority)
        && dependencies_satisfied(def, status)
        && !sequential_blocked(plan, status, def)
}

/// All tasks eligible to start right now, in phase-then-id order. This
/// ignores batch size and file conflicts — it's the full candidate set
/// [`next_batch`] packs down from.
pub fn ready_tasks<'a>(plan: &'a Plan, status: &Status, options: &SchedulerOptions) -> Vec<&'a TaskDef> {
    plan.tasks_in_order()
        .into_iter()
        .filter(|def| is_ready(plan, status, def, options))
        .collect()
}

/// Select the next batch of task ids to dispatch: ready tasks packed into
/// the remaining parallelism budget (capped again at `max_batch`), skipping
/// any task whose file references overlap one already chosen for this
/// batch.
pub fn next_batch(plan: &Plan, status: &Status, options: &SchedulerOptions) -> Vec<TaskId> {
    let in_flight = status
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();
    let mut capacity = options
        .max_parallel
        .saturating_sub(in_flight)
        .min(options.max_batch);
    if capacity == 0 {
        return Vec::new();
    }

    let mut batch = Vec::new();
    let mut claimed_files: HashSet<&str> = HashSet::new();

    for def in ready_tasks(plan, status, options) {
        if capacity == 0 {
            break;
        }
        if def.file_refs.iter().any(|f| claimed_files.contains(f.as_str())) {
            continue;
        }
        claimed_files.extend(def.file_refs.iter().map(|f| f.as_str()));
        batch.push(def.id.clone());
        capacity -= 1;
    }

    batch
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
