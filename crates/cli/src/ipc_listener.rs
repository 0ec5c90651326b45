// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control socket listener: accepts connections on the per-instance
//! unix socket and dispatches each request against the shared state,
//! without blocking the orchestration loop.

use crate::control::{dispatch, LocalControl};
use conductor_ipc::{read_request_default, write_response_default, ProtocolError};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, warn};

/// Bind the control socket at `path`, removing any stale file first. Mode
/// 0600: only the owning user may connect.
pub fn bind(path: &Path) -> std::io::Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

/// Accept connections until the shutdown token fires, handling each one in
/// its own task.
pub async fn run(listener: UnixListener, control: Arc<LocalControl>, shutdown: tokio_util::sync::CancellationToken) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let control = Arc::clone(&control);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, &control).await {
                                match err {
                                    ProtocolError::ConnectionClosed => debug!("control client disconnected"),
                                    ProtocolError::Timeout => warn!("control connection timed out"),
                                    other => error!(error = %other, "control connection error"),
                                }
                            }
                        });
                    }
                    Err(err) => error!(error = %err, "control socket accept error"),
                }
            }
            () = shutdown.cancelled() => {
                debug!("control socket listener shutting down");
                return;
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, control: &LocalControl) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    let request = read_request_default(&mut reader).await?;
    debug!(?request, "received control request");
    let response = dispatch(control, request).await;
    write_response_default(&mut writer, &response).await
}
