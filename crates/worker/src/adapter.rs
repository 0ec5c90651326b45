// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `WorkerAdapter` seam: spawn a task's worker process and run it to
//! completion, reporting structured events along the way.

use crate::error::WorkerError;
use async_trait::async_trait;
use conductor_core::TaskId;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything needed to spawn a worker for one task.
#[derive(Debug, Clone)]
pub struct WorkSpec {
    pub task_id: TaskId,
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

/// A structured marker parsed from a worker's stdout, or an unparsed line
/// forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    TaskBegin { task_id: TaskId },
    TaskEnd { task_id: TaskId, ok: bool, message: Option<String> },
    ToolUse { name: String },
    Line(String),
}

/// How a worker run ended.
///
/// The `TASK_END` marker for the task, if one was ever seen, always
/// decides between `Succeeded`/`Failed`; the exit code only decides when no
/// such marker arrived before the process exited (`worker_exit_without_result`
/// in [`crate::process::EXIT_WITHOUT_RESULT`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Emitted a `TASK_END ... ok` marker for this task.
    Succeeded,
    /// Emitted a `TASK_END ... err` marker for this task, or exited without
    /// ever emitting one.
    Failed { message: Option<String> },
    /// The per-task deadline elapsed and the process was killed.
    TimedOut,
}

/// Spawns a worker process for a task and streams its output.
///
/// Implementations own the actual process lifecycle (spawn, stdout
/// streaming, timeout enforcement, signal escalation); [`crate::process::ProcessAdapter`]
/// is the real one, backed by `tokio::process::Command`.
#[async_trait]
pub trait WorkerAdapter: Send + Sync + 'static {
    /// Run `spec` to completion, publishing every parsed [`WorkerEvent`] to
    /// `events` as it's observed. Returns once the process has exited, been
    /// killed for timing out, or failed to spawn.
    async fn run(
        &self,
        spec: WorkSpec,
        events: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerOutcome, WorkerError>;
}
