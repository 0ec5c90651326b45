// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling loop: pick the next batch, spawn a worker per task,
//! apply the retry/skip policy to failures, sweep stuck tasks, and persist
//! `status.json` after every change. Runs until the plan reaches a
//! terminal state or is told to stop.

use crate::state::OrchestratorState;
use conductor_core::{Event, EventPayload, TaskId, TaskStatus};
use conductor_scheduler::{next_batch, SchedulerOptions};
use conductor_worker::{is_retry_eligible, skip_cascade, WorkSpec, WorkerAdapter, WorkerEvent, WorkerOutcome, WorkerPool};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Tuning passed down from the CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_parallel: usize,
    pub max_iterations: u64,
    pub timeout_per_task: Duration,
}

/// A worker finishing, reported back to the scheduling loop.
struct TaskFinished {
    task_id: TaskId,
    outcome: Result<WorkerOutcome, conductor_worker::WorkerError>,
}

/// How the run ended, for the final summary printed by `main`.
pub enum EngineExit {
    /// Every task reached a terminal state.
    Finished,
    /// `--max-iterations` was reached with work still pending.
    IterationLimitReached,
    /// A stop was requested over a control surface.
    StoppedByRequest,
}

const TICK: Duration = Duration::from_millis(250);
const HEARTBEAT_EVERY: Duration = Duration::from_secs(30);

/// Drive `state`'s plan to completion using `worker` to run each task.
pub async fn run(state: Arc<OrchestratorState>, worker: Arc<dyn WorkerAdapter>, options: EngineOptions) -> EngineExit {
    let pool = WorkerPool::new(options.max_parallel.max(1));
    let scheduler_options = SchedulerOptions { max_parallel: options.max_parallel, ..SchedulerOptions::default() };
    let (finished_tx, mut finished_rx) = mpsc::channel::<TaskFinished>(64);

    let mut in_flight: HashSet<TaskId> = HashSet::new();
    let mut tick = tokio::time::interval(TICK);
    let mut last_heartbeat = tokio::time::Instant::now();
    let mut iterations: u64 = 0;
    let shutdown = state.shutdown_token();

    loop {
        if shutdown.is_cancelled() {
            return finish(&state, EngineExit::StoppedByRequest);
        }

        tokio::select! {
            biased;

            Some(done) = finished_rx.recv() => {
                in_flight.remove(&done.task_id);
                apply_outcome(&state, &done.task_id, done.outcome);
                persist(&state);
            }

            _ = tick.tick() => {
                iterations += 1;
                sweep_stuck(&state);

                if last_heartbeat.elapsed() >= HEARTBEAT_EVERY {
                    last_heartbeat = tokio::time::Instant::now();
                    heartbeat(&state);
                }

                if is_done(&state) {
                    return finish(&state, EngineExit::Finished);
                }

                if options.max_iterations != 0 && iterations >= options.max_iterations {
                    return finish(&state, EngineExit::IterationLimitReached);
                }

                if state.is_paused() {
                    continue;
                }

                let batch = state.with_status(|status| next_batch(&state.plan, status, &scheduler_options));
                if batch.is_empty() {
                    continue;
                }

                state.events.publish(Event::new(
                    state.plan_id(),
                    state.now(),
                    EventPayload::BatchStarted { task_ids: batch.clone() },
                ));

                for task_id in batch {
                    if in_flight.contains(&task_id) {
                        continue;
                    }
                    in_flight.insert(task_id.clone());
                    start_task(&state, Arc::clone(&worker), pool.clone(), task_id, options.timeout_per_task, finished_tx.clone());
                }
            }
        }
    }
}

fn start_task(
    state: &Arc<OrchestratorState>,
    worker: Arc<dyn WorkerAdapter>,
    pool: WorkerPool,
    task_id: TaskId,
    timeout: Duration,
    finished_tx: mpsc::Sender<TaskFinished>,
) {
    let now = state.now();
    state.with_status_mut(|status| {
        let _ = conductor_status::update_task(status, &task_id, TaskStatus::InProgress, now, None);
    });
    state.events.publish(Event::new(
        state.plan_id(),
        now,
        EventPayload::TaskStarted { task_id: task_id.clone() },
    ));

    let spec = work_spec(state, &task_id, timeout);
    let state = Arc::clone(state);

    tokio::spawn(async move {
        let _permit = pool.acquire().await;
        let (events_tx, mut events_rx) = mpsc::channel::<WorkerEvent>(256);
        let plan_id = state.plan_id().to_string();
        let forward_state = Arc::clone(&state);
        let task_id_for_forward = task_id.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                if let WorkerEvent::Line(line) = event {
                    forward_state.events.publish(Event::new(
                        plan_id.clone(),
                        forward_state.now(),
                        EventPayload::WorkerStdout { task_id: Some(task_id_for_forward.clone()), line },
                    ));
                }
            }
        });

        let outcome = worker.run(spec, events_tx).await;
        drop(forward);
        let _ = finished_tx.send(TaskFinished { task_id, outcome }).await;
    });
}

fn work_spec(state: &OrchestratorState, task_id: &TaskId, timeout: Duration) -> WorkSpec {
    let (command, args) = crate::config::worker_command();
    let cwd = state
        .plan_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let description = state
        .plan
        .tasks
        .get(task_id)
        .map(|def| def.description.clone())
        .unwrap_or_default();

    WorkSpec {
        task_id: task_id.clone(),
        command,
        args,
        cwd,
        env: vec![
            ("CONDUCTOR_PLAN_ID".to_string(), state.plan_id().to_string()),
            ("CONDUCTOR_TASK_ID".to_string(), task_id.as_str().to_string()),
            ("CONDUCTOR_TASK_DESCRIPTION".to_string(), description),
            (
                "CONDUCTOR_FINDINGS_DIR".to_string(),
                state.config.findings_dir().to_string_lossy().into_owned(),
            ),
        ],
        timeout,
    }
}

fn apply_outcome(state: &OrchestratorState, task_id: &TaskId, outcome: Result<WorkerOutcome, conductor_worker::WorkerError>) {
    let now = state.now();
    match outcome {
        Ok(WorkerOutcome::Succeeded) => {
            state.with_status_mut(|status| {
                let _ = conductor_status::update_task(status, task_id, TaskStatus::Completed, now, None);
            });
            let duration_ms = state
                .with_status(|status| status.task(task_id).and_then(|t| t.duration_ms))
                .unwrap_or(0);
            state.events.publish(Event::new(
                state.plan_id(),
                now,
                EventPayload::TaskCompleted { task_id: task_id.clone(), duration_ms },
            ));
        }
        Ok(WorkerOutcome::Failed { message }) => fail_task(state, task_id, message.unwrap_or_else(|| "worker failed".to_string()), now),
        Ok(WorkerOutcome::TimedOut) => fail_task(state, task_id, "timed out".to_string(), now),
        Err(err) => fail_task(state, task_id, err.to_string(), now),
    }
}

fn fail_task(state: &OrchestratorState, task_id: &TaskId, error: String, now: chrono::DateTime<chrono::Utc>) {
    // Transition to failed first: retry eligibility is judged from the
    // failed state (retry_count, stuck_detected), not from in_progress.
    let (retryable, cascade) = state.with_status_mut(|status| {
        let _ = conductor_status::update_task(status, task_id, TaskStatus::Failed, now, Some(error.clone()));

        if is_retry_eligible(status, task_id) {
            let _ = conductor_status::update_task(status, task_id, TaskStatus::Pending, now, None);
            return (true, Vec::new());
        }

        let cascade = skip_cascade(status, task_id);
        for dependent in &cascade {
            let _ = conductor_status::update_task(status, dependent, TaskStatus::Skipped, now, None);
        }
        (false, cascade)
    });

    state.events.publish(Event::new(
        state.plan_id(),
        now,
        EventPayload::TaskFailed { task_id: task_id.clone(), error },
    ));

    if retryable {
        info!(%task_id, "retrying failed task");
        return;
    }

    for dependent in cascade {
        state.events.publish(Event::new(
            state.plan_id(),
            now,
            EventPayload::TaskSkipped { task_id: dependent, reason: format!("dependency {task_id} failed") },
        ));
    }
}

fn sweep_stuck(state: &OrchestratorState) {
    let now = state.now();
    let swept = state.with_status_mut(|status| conductor_status::sweep_stuck(status, now));
    for task_id in swept {
        warn!(%task_id, "task exceeded the stuck threshold, marked failed");
        state.events.publish(Event::new(
            state.plan_id(),
            now,
            EventPayload::TaskFailed { task_id, error: "stuck_timeout".to_string() },
        ));
    }
}

fn heartbeat(state: &OrchestratorState) {
    if let Err(err) = conductor_registry::heartbeat(
        state.config.registry_dir(),
        state.plan_id(),
        &state.instance_id,
        state.now(),
    ) {
        warn!(error = %err, "failed to refresh registry heartbeat");
    }
    let dropped = state.events.dropped_since(state.plan_id());
    if dropped > 0 {
        state.events.publish(Event::new(
            state.plan_id(),
            state.now(),
            EventPayload::BusDropped { count: dropped },
        ));
    }
}

fn is_done(state: &OrchestratorState) -> bool {
    state.with_status(|status| status.tasks.iter().all(|t| t.is_terminal()))
}

fn persist(state: &OrchestratorState) {
    let now = state.now();
    let result = state.with_status_mut(|status| {
        conductor_status::save(&conductor_status::status_path(&state.config.plan_dir), status, now)
    });
    if let Err(err) = result {
        warn!(error = %err, "failed to persist status.json");
    }
}

fn finish(state: &OrchestratorState, exit: EngineExit) -> EngineExit {
    persist(state);
    let (reason, exit_code) = match &exit {
        EngineExit::Finished => ("plan finished".to_string(), 0),
        EngineExit::IterationLimitReached => ("max-iterations reached".to_string(), 0),
        EngineExit::StoppedByRequest => ("stop requested".to_string(), 0),
    };
    state.events.publish(Event::new(
        state.plan_id(),
        state.now(),
        EventPayload::OrchestratorShutdown { reason, exit_code },
    ));
    exit
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
