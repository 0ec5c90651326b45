// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from the instance registry.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("plan {plan_id:?} is already running under pid {existing_pid} (started {started_at})")]
    AlreadyRunning {
        plan_id: String,
        existing_pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Store(#[from] conductor_store::StoreError),
}
