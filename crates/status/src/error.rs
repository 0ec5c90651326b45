// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the `status.json` lifecycle.

use conductor_core::TaskId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status document for plan {plan_id:?} could not be recovered from {path}: primary, backup, and rebuild-from-plan all failed")]
    Unrecoverable { plan_id: String, path: PathBuf },

    #[error("task {task_id} has no status entry")]
    UnknownTask { task_id: TaskId },

    #[error("task {task_id}: {from} -> {to} is not an allowed transition")]
    InvalidTransition {
        task_id: TaskId,
        from: conductor_core::TaskStatus,
        to: conductor_core::TaskStatus,
    },

    #[error(transparent)]
    Store(#[from] conductor_store::StoreError),
}
