// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout and environment overrides. Three roots per §6.3:
//! output (per-plan state), config (the registry), runtime (IPC sockets).

use std::path::PathBuf;
use std::time::Duration;

/// Resolved paths and tuning for one orchestrator run.
#[derive(Debug, Clone)]
pub struct Config {
    pub plan_id: String,
    pub plan_dir: PathBuf,
    pub config_dir: PathBuf,
    pub runtime_dir: PathBuf,
    pub socket_path: PathBuf,
}

impl Config {
    pub fn resolve(plan_id: &str) -> Result<Self, ConfigError> {
        let config_dir = config_root()?;
        let runtime_dir = runtime_root()?;
        let plan_dir = output_root()?.join(plan_id);
        let socket_path = runtime_dir.join(format!("orchestrator-{plan_id}.sock"));
        Ok(Self {
            plan_id: plan_id.to_string(),
            plan_dir,
            config_dir,
            runtime_dir,
            socket_path,
        })
    }

    pub fn registry_dir(&self) -> &std::path::Path {
        &self.config_dir
    }

    pub fn findings_dir(&self) -> PathBuf {
        self.plan_dir.join("findings")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.plan_dir.join("logs")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a home directory to derive state paths from")]
    NoHomeDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `CONDUCTOR_OUTPUT_ROOT` > `XDG_DATA_HOME/conductor` > `~/.local/share/conductor`.
pub fn output_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CONDUCTOR_OUTPUT_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join("conductor"));
    }
    Ok(dirs::data_dir().ok_or(ConfigError::NoHomeDir)?.join("conductor"))
}

/// `CONDUCTOR_CONFIG_ROOT` > `XDG_CONFIG_HOME/conductor` > `~/.config/conductor`.
pub fn config_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CONDUCTOR_CONFIG_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("conductor"));
    }
    Ok(dirs::config_dir().ok_or(ConfigError::NoHomeDir)?.join("conductor"))
}

/// `CONDUCTOR_RUNTIME_ROOT` > `XDG_RUNTIME_DIR/conductor` > `~/.local/state/conductor/run`.
pub fn runtime_root() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CONDUCTOR_RUNTIME_ROOT") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(xdg).join("conductor"));
    }
    Ok(dirs::state_dir()
        .ok_or(ConfigError::NoHomeDir)?
        .join("conductor")
        .join("run"))
}

/// Where the log file for this instance goes.
pub fn log_path(config: &Config) -> PathBuf {
    config.plan_dir.join("orchestrator.log")
}

/// The command template used to run a worker for one task:
/// `CONDUCTOR_WORKER_COMMAND`, split on whitespace, defaulting to a plain
/// echo so a fresh checkout can run end-to-end without external setup.
pub fn worker_command() -> (String, Vec<String>) {
    let template = std::env::var("CONDUCTOR_WORKER_COMMAND")
        .unwrap_or_else(|_| "conductor-worker-shim".to_string());
    let mut parts = template.split_whitespace().map(str::to_string);
    let command = parts.next().unwrap_or_else(|| "true".to_string());
    (command, parts.collect())
}

/// Registry heartbeat cadence (§4.6: default interval 30s).
pub fn heartbeat_interval() -> Duration {
    Duration::from_secs(30)
}

/// Registry liveness timeout: 2x the heartbeat interval.
pub fn heartbeat_timeout() -> chrono::Duration {
    chrono::Duration::from_std(heartbeat_interval() * 2).unwrap_or(chrono::Duration::seconds(60))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
