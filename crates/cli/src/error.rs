// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level error type and its exit-code mapping.

use thiserror::Error;

/// Exit codes returned by `main`, per the documented CLI contract.
pub const EXIT_OK: i32 = 0;
pub const EXIT_INTERNAL_ERROR: i32 = 1;
pub const EXIT_INVALID_ARGUMENTS: i32 = 2;
pub const EXIT_ALREADY_RUNNING: i32 = 3;
pub const EXIT_PLAN_NOT_FOUND: i32 = 4;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("plan not found: {0}")]
    PlanNotFound(String),

    #[error("failed to parse plan: {0}")]
    ParseFailed(#[from] conductor_plan::ParseError),

    #[error("another instance is already running this plan (pid {existing_pid})")]
    AlreadyRunning { existing_pid: u32 },

    #[error("registry error: {0}")]
    Registry(#[from] conductor_registry::RegistryError),

    #[error("status error: {0}")]
    Status(#[from] conductor_status::StatusError),

    #[error("store error: {0}")]
    Store(#[from] conductor_store::StoreError),

    #[error("ipc error: {0}")]
    Ipc(#[from] conductor_ipc::ProtocolError),

    #[error("no instance matches id {0}")]
    UnknownInstance(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArguments(_) => EXIT_INVALID_ARGUMENTS,
            CliError::PlanNotFound(_) => EXIT_PLAN_NOT_FOUND,
            CliError::ParseFailed(_) => EXIT_PLAN_NOT_FOUND,
            CliError::AlreadyRunning { .. } => EXIT_ALREADY_RUNNING,
            CliError::Registry(conductor_registry::RegistryError::AlreadyRunning {
                ..
            }) => EXIT_ALREADY_RUNNING,
            _ => EXIT_INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
