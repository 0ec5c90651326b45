// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The query/control flags that talk to *other* running instances rather
//! than starting a new one: `--list`, `--status`, `--stop`, `--shutdown-all`.

use crate::config;
use crate::error::CliError;
use conductor_ipc::{Request, Response};
use conductor_registry::RegistryEntry;
use std::path::Path;
use std::time::Duration;
use tokio::net::UnixStream;

/// Connect to an instance's control socket and round-trip one request.
async fn request(socket_path: &Path, req: Request) -> Result<Response, CliError> {
    let mut stream = tokio::time::timeout(Duration::from_secs(5), UnixStream::connect(socket_path))
        .await
        .map_err(|_| CliError::Internal(format!("timed out connecting to {}", socket_path.display())))?
        .map_err(CliError::Io)?;
    conductor_ipc::write_message(&mut stream, &conductor_ipc::encode(&req)?).await?;
    let bytes = conductor_ipc::read_message(&mut stream).await?;
    Ok(conductor_ipc::decode(&bytes)?)
}

fn socket_path_for(plan_id: &str) -> Result<std::path::PathBuf, CliError> {
    Ok(config::runtime_root()?.join(format!("orchestrator-{plan_id}.sock")))
}

/// `--list`: print every registered instance.
pub async fn list() -> Result<(), CliError> {
    let dir = config::config_root()?;
    let entries = conductor_registry::list(&dir)?;
    if entries.is_empty() {
        println!("no orchestrator instances registered");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}\tplan={}\tpid={}\tstarted={}\tlast_heartbeat={}",
            entry.instance_id, entry.plan_id, entry.pid, entry.started_at, entry.last_heartbeat
        );
    }
    Ok(())
}

fn find_entry<'a>(entries: &'a [RegistryEntry], instance_id: &str) -> Result<&'a RegistryEntry, CliError> {
    entries
        .iter()
        .find(|e| e.instance_id.as_str() == instance_id)
        .ok_or_else(|| CliError::UnknownInstance(instance_id.to_string()))
}

/// `--status <instance-id>`: fetch and print the full status document.
pub async fn status(instance_id: &str) -> Result<(), CliError> {
    let dir = config::config_root()?;
    let entries = conductor_registry::list(&dir)?;
    let entry = find_entry(&entries, instance_id)?;
    let socket_path = socket_path_for(&entry.plan_id)?;

    match request(&socket_path, Request::Status).await? {
        Response::Status { status } => {
            let json = serde_json::to_string_pretty(&status).map_err(|e| CliError::Internal(e.to_string()))?;
            println!("{json}");
            Ok(())
        }
        Response::Error { code, message } => Err(CliError::Internal(format!("{code:?}: {message}"))),
        other => Err(CliError::Internal(format!("unexpected response: {other:?}"))),
    }
}

/// `--stop <instance-id>`: ask one instance to shut down.
pub async fn stop(instance_id: &str) -> Result<(), CliError> {
    let dir = config::config_root()?;
    let entries = conductor_registry::list(&dir)?;
    let entry = find_entry(&entries, instance_id)?;
    let socket_path = socket_path_for(&entry.plan_id)?;

    match request(&socket_path, Request::Shutdown { force: false }).await? {
        Response::ShuttingDown => {
            println!("{instance_id}: shutting down");
            Ok(())
        }
        Response::Error { code, message } => Err(CliError::Internal(format!("{code:?}: {message}"))),
        other => Err(CliError::Internal(format!("unexpected response: {other:?}"))),
    }
}

/// `--shutdown-all`: ask every registered instance to stop, best-effort.
/// One instance failing to respond doesn't stop the rest from being asked.
pub async fn shutdown_all() -> Result<(), CliError> {
    let dir = config::config_root()?;
    let entries = conductor_registry::list(&dir)?;
    for entry in entries {
        let socket_path = socket_path_for(&entry.plan_id)?;
        match request(&socket_path, Request::Shutdown { force: true }).await {
            Ok(_) => println!("{}: shutdown requested", entry.instance_id),
            Err(err) => eprintln!("{}: failed to reach instance: {err}", entry.instance_id),
        }
    }
    Ok(())
}
