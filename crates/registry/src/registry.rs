// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Register, heartbeat, unregister, and list running orchestrator
//! instances, one per plan. A plan can have at most one live instance;
//! enforced by an exclusive file lock plus a liveness check on the pid
//! recorded in any existing entry.

use crate::entry::{Registry, RegistryEntry};
use crate::error::RegistryError;
use chrono::{DateTime, Duration, Utc};
use conductor_core::InstanceId;
use conductor_store::LockOptions;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn registry_path(dir: &Path) -> PathBuf {
    dir.join("registry.json")
}

fn lock_path(dir: &Path) -> PathBuf {
    dir.join("registry.lock")
}

fn pid_is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

fn load(path: &Path) -> Result<Registry, RegistryError> {
    Ok(conductor_store::read_json_or_quarantine::<Registry>(path)?.unwrap_or_default())
}

/// Claim `plan_id` for `instance_id`. Fails with [`RegistryError::AlreadyRunning`]
/// if another entry for the same plan has a live pid. A stale entry (dead
/// pid) is silently replaced.
pub fn register(
    dir: &Path,
    plan_id: &str,
    instance_id: InstanceId,
    now: DateTime<Utc>,
) -> Result<(), RegistryError> {
    let _lock = conductor_store::acquire_exclusive(&lock_path(dir), &LockOptions::default())?;
    let mut registry = load(&registry_path(dir))?;

    if let Some(existing) = registry.entry_for(plan_id) {
        if pid_is_alive(existing.pid) {
            return Err(RegistryError::AlreadyRunning {
                plan_id: plan_id.to_string(),
                existing_pid: existing.pid,
                started_at: existing.started_at,
            });
        }
        info!(plan_id, pid = existing.pid, "replacing stale registry entry");
    }

    registry.entries.retain(|e| e.plan_id != plan_id);
    registry.entries.push(RegistryEntry {
        plan_id: plan_id.to_string(),
        instance_id,
        pid: std::process::id(),
        started_at: now,
        last_heartbeat: now,
    });
    conductor_store::write_atomic(&registry_path(dir), &registry)?;
    Ok(())
}

/// Refresh `last_heartbeat` for `plan_id`'s entry, if `instance_id` still
/// owns it.
pub fn heartbeat(
    dir: &Path,
    plan_id: &str,
    instance_id: &InstanceId,
    now: DateTime<Utc>,
) -> Result<(), RegistryError> {
    let _lock = conductor_store::acquire_exclusive(&lock_path(dir), &LockOptions::default())?;
    let mut registry = load(&registry_path(dir))?;
    if let Some(entry) = registry
        .entries
        .iter_mut()
        .find(|e| e.plan_id == plan_id && &e.instance_id == instance_id)
    {
        entry.last_heartbeat = now;
        conductor_store::write_atomic(&registry_path(dir), &registry)?;
    }
    Ok(())
}

/// Release `plan_id`'s entry, if `instance_id` still owns it.
pub fn unregister(dir: &Path, plan_id: &str, instance_id: &InstanceId) -> Result<(), RegistryError> {
    let _lock = conductor_store::acquire_exclusive(&lock_path(dir), &LockOptions::default())?;
    let mut registry = load(&registry_path(dir))?;
    let before = registry.entries.len();
    registry
        .entries
        .retain(|e| !(e.plan_id == plan_id && &e.instance_id == instance_id));
    if registry.entries.len() != before {
        conductor_store::write_atomic(&registry_path(dir), &registry)?;
    }
    Ok(())
}

/// All currently registered entries.
pub fn list(dir: &Path) -> Result<Vec<RegistryEntry>, RegistryError> {
    Ok(load(&registry_path(dir))?.entries)
}

/// Remove entries whose pid is no longer alive, or whose heartbeat hasn't
/// been refreshed within `stale_after`. Returns the removed entries.
pub fn sweep_dead(
    dir: &Path,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Result<Vec<RegistryEntry>, RegistryError> {
    let _lock = conductor_store::acquire_exclusive(&lock_path(dir), &LockOptions::default())?;
    let mut registry = load(&registry_path(dir))?;

    let (alive, dead): (Vec<_>, Vec<_>) = registry.entries.into_iter().partition(|e| {
        pid_is_alive(e.pid) && now - e.last_heartbeat < stale_after
    });
    registry.entries = alive;

    if !dead.is_empty() {
        conductor_store::write_atomic(&registry_path(dir), &registry)?;
    }
    Ok(dead)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
