// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("timed out acquiring lock on {path}")]
    LockTimeout { path: PathBuf },

    #[error("lock on {path} appears stale but its holder (pid {pid}) could not be reaped")]
    StaleLockUnreapable { path: PathBuf, pid: i32 },

    #[error("{path} not found")]
    NotFound { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
