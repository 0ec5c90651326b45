// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed event vocabulary published on the event bus.

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published event. `timestamp` and `plan_id` are common envelope fields;
/// `payload` carries the type-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub plan_id: String,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(plan_id: impl Into<String>, now: DateTime<Utc>, payload: EventPayload) -> Self {
        Self {
            timestamp: now,
            plan_id: plan_id.into(),
            payload,
        }
    }

    /// The stable wire/event-type name.
    pub fn type_name(&self) -> &'static str {
        self.payload.type_name()
    }
}

/// Tagged union of every event type. `#[serde(tag = "type")]`
/// gives each variant a stable `type` discriminator on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    TaskStarted { task_id: TaskId },
    TaskCompleted { task_id: TaskId, duration_ms: u64 },
    TaskFailed { task_id: TaskId, error: String },
    TaskSkipped { task_id: TaskId, reason: String },
    TaskRejected { task_id: TaskId, reason: String },
    PhaseChanged { phase: String },
    BatchStarted { task_ids: Vec<TaskId> },
    BatchCompleted { task_ids: Vec<TaskId> },
    WorkerSpawned { task_ids: Vec<TaskId>, pid: Option<u32> },
    WorkerExited { task_ids: Vec<TaskId>, code: Option<i32> },
    WorkerStdout { task_id: Option<TaskId>, line: String },
    SummaryFixed { details: String },
    RecoveryFromBackup,
    RecoveryRebuilt,
    OrchestratorPaused,
    OrchestratorResumed,
    OrchestratorShutdown { reason: String, exit_code: i32 },
    BusDropped { count: u64 },
}

impl EventPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventPayload::TaskStarted { .. } => "task.started",
            EventPayload::TaskCompleted { .. } => "task.completed",
            EventPayload::TaskFailed { .. } => "task.failed",
            EventPayload::TaskSkipped { .. } => "task.skipped",
            EventPayload::TaskRejected { .. } => "task.rejected",
            EventPayload::PhaseChanged { .. } => "phase.changed",
            EventPayload::BatchStarted { .. } => "batch.started",
            EventPayload::BatchCompleted { .. } => "batch.completed",
            EventPayload::WorkerSpawned { .. } => "worker.spawned",
            EventPayload::WorkerExited { .. } => "worker.exited",
            EventPayload::WorkerStdout { .. } => "worker.stdout",
            EventPayload::SummaryFixed { .. } => "summary.fixed",
            EventPayload::RecoveryFromBackup => "recovery.from_backup",
            EventPayload::RecoveryRebuilt => "recovery.rebuilt",
            EventPayload::OrchestratorPaused => "orchestrator.paused",
            EventPayload::OrchestratorResumed => "orchestrator.resumed",
            EventPayload::OrchestratorShutdown { .. } => "orchestrator.shutdown",
            EventPayload::BusDropped { .. } => "bus.dropped",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
