// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the running instance's [`OrchestratorState`] to both control
//! surfaces: the [`ControlPlane`] trait the embedded push server calls
//! in-process, and the [`Request`]/[`Response`] vocabulary the IPC socket
//! exchanges with other processes. Both surfaces apply the same six
//! mutations to the same state, so their logic lives here once.

use crate::state::OrchestratorState;
use async_trait::async_trait;
use conductor_core::{Summary, Task, TaskId, TaskStatus};
use conductor_http::{
    ControlError, ControlPlane, PlanDetail, PlanStatusLight, PlanSummary, ResourceEntry,
    StartRequest, WorktreeEntry,
};
use conductor_ipc::{ErrorCode as IpcErrorCode, Request, Response};
use conductor_worker::{is_retry_eligible, skip_cascade};
use std::sync::Arc;
use tracing::{info, warn};

pub struct LocalControl {
    state: Arc<OrchestratorState>,
}

impl LocalControl {
    pub fn new(state: Arc<OrchestratorState>) -> Self {
        Self { state }
    }

    fn detail(&self) -> PlanDetail {
        self.state.with_status(|status| PlanDetail {
            plan_id: self.state.plan_id().to_string(),
            plan_path: self.state.plan_path.clone(),
            current_phase: status.current_phase.clone(),
            summary: status.summary.clone(),
            tasks: status.tasks.clone(),
        })
    }

    fn check_plan(&self, plan_id: &str) -> Result<(), ControlError> {
        if plan_id != self.state.plan_id() {
            return Err(ControlError::PlanNotFound(plan_id.to_string()));
        }
        Ok(())
    }

    /// Mark `task_id` skipped and cascade the skip to every still-pending
    /// dependent, persisting once for the whole batch.
    fn skip_with_cascade(&self, task_id: &TaskId, reason: String) -> Result<(), ControlError> {
        let now = self.state.now();
        self.state.with_status_mut(|status| {
            let cascade = skip_cascade(status, task_id);
            conductor_status::update_task(status, task_id, TaskStatus::Skipped, now, None)
                .map_err(to_control_error)?;
            for dependent in &cascade {
                let _ = conductor_status::update_task(
                    status,
                    dependent,
                    TaskStatus::Skipped,
                    now,
                    None,
                );
            }
            conductor_status::save(&conductor_status::status_path(&self.state.config.plan_dir), status, now)
                .map_err(to_control_error)?;
            self.state.events.publish(conductor_core::Event::new(
                self.state.plan_id(),
                now,
                conductor_core::EventPayload::TaskSkipped {
                    task_id: task_id.clone(),
                    reason: reason.clone(),
                },
            ));
            for dependent in &cascade {
                self.state.events.publish(conductor_core::Event::new(
                    self.state.plan_id(),
                    now,
                    conductor_core::EventPayload::TaskSkipped {
                        task_id: dependent.clone(),
                        reason: format!("cascaded from {task_id}"),
                    },
                ));
            }
            Ok(())
        })
    }

    fn retry(&self, task_id: &TaskId) -> Result<(), ControlError> {
        let now = self.state.now();
        self.state.with_status_mut(|status| {
            if !is_retry_eligible(status, task_id) {
                warn!(%task_id, "retry requested for a task that is not in a retryable state");
            }
            conductor_status::update_task(status, task_id, TaskStatus::Pending, now, None)
                .map_err(to_control_error)?;
            conductor_status::save(&conductor_status::status_path(&self.state.config.plan_dir), status, now)
                .map_err(to_control_error)?;
            Ok(())
        })
    }
}

fn to_control_error(err: conductor_status::StatusError) -> ControlError {
    match err {
        conductor_status::StatusError::UnknownTask { task_id } => {
            ControlError::InvalidArgument(format!("unknown task {task_id}"))
        }
        conductor_status::StatusError::InvalidTransition { task_id, from, to } => {
            ControlError::InvalidArgument(format!("task {task_id}: {from:?} -> {to:?} is not allowed"))
        }
        other => ControlError::Internal(other.to_string()),
    }
}

#[async_trait]
impl ControlPlane for LocalControl {
    async fn list_plans(&self) -> Vec<PlanSummary> {
        let detail = self.detail();
        vec![PlanSummary {
            plan_id: detail.plan_id,
            current_phase: detail.current_phase,
            summary: detail.summary,
        }]
    }

    async fn plan_detail(&self, plan_id: &str) -> Option<PlanDetail> {
        (plan_id == self.state.plan_id()).then(|| self.detail())
    }

    async fn plan_status(&self, plan_id: &str) -> Option<PlanStatusLight> {
        if plan_id != self.state.plan_id() {
            return None;
        }
        let detail = self.detail();
        let active_tasks = detail
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .map(|t| t.id.clone())
            .collect();
        Some(PlanStatusLight {
            plan_id: detail.plan_id,
            current_phase: detail.current_phase,
            summary: detail.summary,
            active_tasks,
        })
    }

    async fn plan_tasks(&self, plan_id: &str) -> Option<Vec<Task>> {
        (plan_id == self.state.plan_id()).then(|| self.detail().tasks)
    }

    async fn finding(&self, plan_id: &str, task_id: &TaskId) -> Option<String> {
        if plan_id != self.state.plan_id() {
            return None;
        }
        let path = self.state.config.findings_dir().join(format!("{}.md", task_id.as_str()));
        std::fs::read_to_string(path).ok()
    }

    async fn logs(&self, plan_id: &str, lines: usize) -> Option<String> {
        if plan_id != self.state.plan_id() {
            return None;
        }
        let path = crate::config::log_path(&self.state.config);
        let content = std::fs::read_to_string(path).ok()?;
        Some(tail_lines(&content, lines))
    }

    async fn start(&self, plan_id: &str, _req: StartRequest) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        Err(ControlError::AlreadyRunning)
    }

    async fn stop(&self, plan_id: &str, _force: bool) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        self.state.request_shutdown();
        Ok(())
    }

    async fn pause(&self, plan_id: &str) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        self.state.set_paused(true);
        self.state.events.publish(conductor_core::Event::new(
            self.state.plan_id(),
            self.state.now(),
            conductor_core::EventPayload::OrchestratorPaused,
        ));
        Ok(())
    }

    async fn resume(&self, plan_id: &str) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        self.state.set_paused(false);
        self.state.events.publish(conductor_core::Event::new(
            self.state.plan_id(),
            self.state.now(),
            conductor_core::EventPayload::OrchestratorResumed,
        ));
        Ok(())
    }

    async fn skip_task(&self, plan_id: &str, task_id: &TaskId, reason: String) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        self.skip_with_cascade(task_id, reason)
    }

    async fn retry_task(&self, plan_id: &str, task_id: &TaskId) -> Result<(), ControlError> {
        self.check_plan(plan_id)?;
        self.retry(task_id)
    }

    async fn resources(&self) -> Vec<ResourceEntry> {
        Vec::new()
    }

    async fn worktrees(&self) -> Vec<WorktreeEntry> {
        Vec::new()
    }
}

/// Returns the last `n` lines of `content`, or all of it if shorter.
fn tail_lines(content: &str, n: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Dispatch one IPC request against the shared state, for the control
/// socket listener.
pub async fn dispatch(control: &LocalControl, request: Request) -> Response {
    let plan_id = control.state.plan_id().to_string();
    match request {
        Request::Status => {
            let status = control.state.with_status(|s| s.clone());
            Response::Status { status: Box::new(status) }
        }
        Request::Pause => match control.pause(&plan_id).await {
            Ok(()) => Response::Paused,
            Err(err) => control_error_to_response(err),
        },
        Request::Resume => match control.resume(&plan_id).await {
            Ok(()) => Response::Resumed,
            Err(err) => control_error_to_response(err),
        },
        Request::Shutdown { force } => match control.stop(&plan_id, force).await {
            Ok(()) => {
                info!("shutdown requested over the control socket");
                Response::ShuttingDown
            }
            Err(err) => control_error_to_response(err),
        },
        Request::SkipTask { id, reason } => match control.skip_task(&plan_id, &id, reason).await {
            Ok(()) => Response::Ok,
            Err(err) => control_error_to_response(err),
        },
        Request::RetryTask { id } => match control.retry_task(&plan_id, &id).await {
            Ok(()) => Response::Ok,
            Err(err) => control_error_to_response(err),
        },
    }
}

fn control_error_to_response(err: ControlError) -> Response {
    let code = match &err {
        ControlError::NotRunning => IpcErrorCode::NotRunning,
        ControlError::InvalidArgument(msg) if msg.starts_with("unknown task") => {
            IpcErrorCode::UnknownTask
        }
        ControlError::InvalidArgument(_) => IpcErrorCode::InvalidTransition,
        _ => IpcErrorCode::Internal,
    };
    Response::Error { code, message: err.to_string() }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
