// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parsed, immutable `Plan` snapshot and its annotation
//! records. `conductor-plan` is the only producer of these
//! types; this crate only defines their shape so `conductor-status` and
//! `conductor-scheduler` can depend on it without depending on the parser.

use crate::task::TaskDef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `## Phase N: Title` heading and its ordered tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub number: u32,
    pub title: String,
    pub task_ids: Vec<crate::task::TaskId>,
}

/// A `[SEQUENTIAL]` group: an ordered list of task ids constrained to run
/// one at a time, in id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialGroup {
    pub task_ids: Vec<crate::task::TaskId>,
}

/// A `pipeline-start: when A.B completes` gate: phase `phase` becomes
/// reachable under default ordering once `trigger` completes, independent
/// of the rest of its own phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStart {
    pub phase: u32,
    pub trigger: crate::task::TaskId,
}

/// A `**VERIFY Phase N:** (non-blocking)` annotation: VERIFY tasks in this
/// phase do not gate readiness of later phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonBlockingVerify {
    pub phase: u32,
}

/// A `Phases X-Y are [PARALLEL]` hint. Advisory only — it never changes
/// correctness, only documents which phases are expected to be
/// conflict-free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelPhases {
    pub phases: Vec<u32>,
}

/// All annotation records extracted while parsing the plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub sequential_groups: Vec<SequentialGroup>,
    #[serde(default)]
    pub pipeline_starts: Vec<PipelineStart>,
    #[serde(default)]
    pub non_blocking_verify: Vec<NonBlockingVerify>,
    #[serde(default)]
    pub parallel_phases: Vec<ParallelPhases>,
}

impl Annotations {
    /// The sequential group containing `task_id`, if any.
    pub fn group_for(&self, task_id: &crate::task::TaskId) -> Option<&SequentialGroup> {
        self.sequential_groups
            .iter()
            .find(|g| g.task_ids.contains(task_id))
    }

    /// True if `phase` has a pipeline-start gate, returning its trigger.
    pub fn trigger_for_phase(&self, phase: u32) -> Option<&crate::task::TaskId> {
        self.pipeline_starts
            .iter()
            .find(|p| p.phase == phase)
            .map(|p| &p.trigger)
    }

    /// True if `phase`'s VERIFY tasks are marked non-blocking.
    pub fn is_non_blocking_verify(&self, phase: u32) -> bool {
        self.non_blocking_verify.iter().any(|v| v.phase == phase)
    }
}

/// A parsed, immutable plan snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub path: std::path::PathBuf,
    pub phases: Vec<Phase>,
    pub tasks: BTreeMap<crate::task::TaskId, TaskDef>,
    pub annotations: Annotations,
}

impl Plan {
    /// Iterate tasks in phase-then-id order, the scheduler's tiebreak order.
    pub fn tasks_in_order(&self) -> Vec<&TaskDef> {
        let mut tasks: Vec<&TaskDef> = self.tasks.values().collect();
        tasks.sort_by(|a, b| {
            a.phase_number
                .cmp(&b.phase_number)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        tasks
    }

    /// Phase number a task belongs to, if known.
    pub fn phase_of(&self, task_id: &crate::task::TaskId) -> Option<u32> {
        self.tasks.get(task_id).map(|t| t.phase_number)
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
