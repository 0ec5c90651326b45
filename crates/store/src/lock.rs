// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exclusive file locking with exponential backoff and stale-lock reaping.

use crate::error::StoreError;
use fs2::FileExt;
use rand::Rng;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Tuning for [`acquire_exclusive`]. Defaults mirror the orchestrator's
/// documented wait budget: ten attempts, capped exponential backoff,
/// roughly ten seconds of wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub max_retries: u32,
    /// A held lock older than this is a candidate for reaping, provided its
    /// recorded holder pid is no longer alive.
    pub stale_after: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            backoff_factor: 1.5,
            max_delay: Duration::from_millis(2000),
            max_retries: 10,
            stale_after: Duration::from_secs(60),
        }
    }
}

fn delay_for_attempt(opts: &LockOptions, attempt: u32) -> Duration {
    let factor = opts.backoff_factor.powi(attempt as i32);
    let scaled = opts.base_delay.mul_f64(factor).min(opts.max_delay);
    let jitter_range = scaled.as_millis() as f64 * 0.25;
    let mut rng = rand::rng();
    let jitter_ms: f64 = rng.random_range(-jitter_range..=jitter_range);
    let millis = (scaled.as_millis() as f64 + jitter_ms).max(0.0) as u64;
    Duration::from_millis(millis)
}

/// A held exclusive lock. The underlying OS lock (and the lock file itself,
/// on a best-effort basis) is released when this is dropped.
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

fn read_holder_pid(path: &Path) -> Option<i32> {
    let mut contents = String::new();
    File::open(path).ok()?.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn pid_is_alive(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid), None).is_ok()
}

fn lock_age(path: &Path) -> Option<Duration> {
    let metadata = std::fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    modified.elapsed().ok()
}

/// Acquire an exclusive lock on `path`, creating it if necessary.
///
/// Retries with capped exponential backoff and jitter. If every retry is
/// exhausted but the lock file is older than `stale_after` and its recorded
/// holder process is no longer running, the lock file is reaped (removed
/// and recreated) and acquisition is retried once more before giving up.
pub fn acquire_exclusive(path: &Path, opts: &LockOptions) -> Result<FileLock, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let mut attempt = 0;
    let mut reaped_once = false;

    loop {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                let mut file = file;
                file.set_len(0).map_err(|source| StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                file.seek(SeekFrom::Start(0))
                    .and_then(|_| writeln!(file, "{}", std::process::id()))
                    .map_err(|source| StoreError::Io {
                        path: path.to_path_buf(),
                        source,
                    })?;
                return Ok(FileLock {
                    file,
                    path: path.to_path_buf(),
                });
            }
            Err(_) => {
                if attempt >= opts.max_retries {
                    if !reaped_once {
                        if let Some(pid) = try_reap_stale(path, opts) {
                            reaped_once = true;
                            warn!(path = %path.display(), pid, "reaped stale lock");
                            continue;
                        }
                        if let Some(pid) = read_holder_pid(path) {
                            return Err(StoreError::StaleLockUnreapable {
                                path: path.to_path_buf(),
                                pid,
                            });
                        }
                    }
                    return Err(StoreError::LockTimeout {
                        path: path.to_path_buf(),
                    });
                }

                std::thread::sleep(delay_for_attempt(opts, attempt));
                attempt += 1;
            }
        }
    }
}

/// If the lock at `path` is older than `opts.stale_after` and its recorded
/// holder pid is dead, remove the lock file and return the dead pid.
fn try_reap_stale(path: &Path, opts: &LockOptions) -> Option<i32> {
    let age = lock_age(path)?;
    if age < opts.stale_after {
        return None;
    }
    let pid = read_holder_pid(path)?;
    if pid_is_alive(pid) {
        return None;
    }
    std::fs::remove_file(path).ok()?;
    Some(pid)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
