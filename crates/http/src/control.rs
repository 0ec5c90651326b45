// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between HTTP handlers and the running orchestrator: the same
//! six mutations the IPC control socket exposes, plus the read-side queries
//! the REST surface needs. A single in-process instance implements both
//! surfaces against the same state, so this trait — not a socket round
//! trip — is how the embedded push server reaches it.

use crate::dto::{PlanDetail, PlanStatusLight, PlanSummary, ResourceEntry, StartRequest, WorktreeEntry};
use async_trait::async_trait;
use conductor_core::{Task, TaskId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("plan {0} not found")]
    PlanNotFound(String),
    #[error("orchestrator already running")]
    AlreadyRunning,
    #[error("orchestrator not running")]
    NotRunning,
    #[error("failed to start: {0}")]
    StartFailed(String),
    #[error("failed to stop: {0}")]
    StopFailed(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    async fn list_plans(&self) -> Vec<PlanSummary>;
    async fn plan_detail(&self, plan_id: &str) -> Option<PlanDetail>;
    async fn plan_status(&self, plan_id: &str) -> Option<PlanStatusLight>;
    async fn plan_tasks(&self, plan_id: &str) -> Option<Vec<Task>>;
    async fn finding(&self, plan_id: &str, task_id: &TaskId) -> Option<String>;
    async fn logs(&self, plan_id: &str, lines: usize) -> Option<String>;

    async fn start(&self, plan_id: &str, req: StartRequest) -> Result<(), ControlError>;
    async fn stop(&self, plan_id: &str, force: bool) -> Result<(), ControlError>;
    async fn pause(&self, plan_id: &str) -> Result<(), ControlError>;
    async fn resume(&self, plan_id: &str) -> Result<(), ControlError>;
    async fn skip_task(&self, plan_id: &str, task_id: &TaskId, reason: String) -> Result<(), ControlError>;
    async fn retry_task(&self, plan_id: &str, task_id: &TaskId) -> Result<(), ControlError>;

    async fn resources(&self) -> Vec<ResourceEntry>;
    async fn worktrees(&self) -> Vec<WorktreeEntry>;
}
