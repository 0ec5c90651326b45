// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from spawning and supervising worker processes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker command {command:?}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("worker stdout pipe unavailable")]
    NoStdout,

    #[error("io error waiting on worker: {0}")]
    Io(#[from] std::io::Error),
}
