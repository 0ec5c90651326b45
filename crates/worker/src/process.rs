// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real [`WorkerAdapter`]: spawns a child process, streams its stdout
//! line-by-line parsing markers, and enforces the per-task timeout with a
//! `SIGTERM`-then-`SIGKILL` escalation.

use crate::adapter::{WorkSpec, WorkerAdapter, WorkerEvent, WorkerOutcome};
use crate::error::WorkerError;
use crate::markers::parse_line;
use async_trait::async_trait;
use conductor_core::TaskId;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Grace period between `SIGTERM` and `SIGKILL` when a worker times out.
pub const KILL_GRACE: Duration = Duration::from_secs(5);

/// A task didn't get a `TASK_END` marker before its worker exited.
pub const EXIT_WITHOUT_RESULT: &str = "worker_exit_without_result";

/// The last `TASK_END` verdict observed for a task, if any: `ok`/`err` plus
/// the optional message that followed it.
type Verdict = Option<(bool, Option<String>)>;

/// Spawns workers as real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessAdapter;

#[async_trait]
impl WorkerAdapter for ProcessAdapter {
    async fn run(
        &self,
        spec: WorkSpec,
        events: mpsc::Sender<WorkerEvent>,
    ) -> Result<WorkerOutcome, WorkerError> {
        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| WorkerError::SpawnFailed {
            command: spec.command.clone(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or(WorkerError::NoStdout)?;
        let stream_task = tokio::spawn(stream_stdout(stdout, events.clone(), spec.task_id.clone()));

        let wait = tokio::time::timeout(spec.timeout, child.wait()).await;
        let timed_out = wait.is_err();
        if timed_out {
            terminate_with_escalation(&mut child).await;
        }
        let status = match wait {
            Ok(Ok(status)) => Some(status),
            Ok(Err(source)) => return Err(WorkerError::Io(source)),
            Err(_elapsed) => None,
        };

        let verdict = stream_task.await.unwrap_or(None);

        let outcome = if timed_out {
            WorkerOutcome::TimedOut
        } else {
            match verdict {
                Some((true, _message)) => WorkerOutcome::Succeeded,
                Some((false, message)) => WorkerOutcome::Failed { message },
                None => WorkerOutcome::Failed {
                    message: Some(match status {
                        Some(status) => format!("{EXIT_WITHOUT_RESULT} (exited with {status})"),
                        None => EXIT_WITHOUT_RESULT.to_string(),
                    }),
                },
            }
        };
        Ok(outcome)
    }
}

/// Stream `stdout` line-by-line, publishing a [`WorkerEvent`] per line, and
/// return the last `TASK_END` verdict seen for `task_id` (`None` if the
/// process exited without ever terminating that task).
async fn stream_stdout(
    stdout: tokio::process::ChildStdout,
    events: mpsc::Sender<WorkerEvent>,
    task_id: TaskId,
) -> Verdict {
    let mut lines = BufReader::new(stdout).lines();
    let mut verdict: Verdict = None;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let event = parse_line(&line);
                if let WorkerEvent::TaskEnd { task_id: ref id, ok, ref message } = event {
                    if *id == task_id {
                        verdict = Some((ok, message.clone()));
                    }
                }
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(%error, "error reading worker stdout");
                break;
            }
        }
    }
    verdict
}

/// Send `SIGTERM`, wait up to [`KILL_GRACE`], then `SIGKILL` if the process
/// is still alive.
async fn terminate_with_escalation(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    send_signal(pid, nix::sys::signal::Signal::SIGTERM);

    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
        return;
    }

    tracing::warn!(pid, "worker ignored SIGTERM, escalating to SIGKILL");
    send_signal(pid, nix::sys::signal::Signal::SIGKILL);
    let _ = child.wait().await;
}

fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    if let Err(error) = kill(Pid::from_raw(pid as i32), signal) {
        tracing::warn!(pid, %signal, %error, "failed to signal worker process");
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
