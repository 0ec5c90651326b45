// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response vocabulary for the per-instance control socket.

use crate::error::ProtocolError;
use crate::wire::{self, DEFAULT_TIMEOUT};
use conductor_core::{Status, TaskId};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A request sent by a CLI or other local client to a running instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Fetch the current status document.
    Status,
    /// Gate the next `NextBatch`: stop starting new work, let in-flight
    /// tasks finish.
    Pause,
    /// Clear a prior pause.
    Resume,
    /// Stop the instance. `force` skips waiting for in-flight tasks.
    Shutdown { force: bool },
    /// Mark a task skipped, cascading to its dependents.
    SkipTask { id: TaskId, reason: String },
    /// Reset a failed task back to pending so the scheduler picks it up
    /// again.
    RetryTask { id: TaskId },
}

/// A typed error code, so clients can branch on failure kind without
/// string-matching `message`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    UnknownTask,
    InvalidTransition,
    NotRunning,
    Internal,
}

/// The response to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Status { status: Box<Status> },
    Paused,
    Resumed,
    ShuttingDown,
    Error { code: ErrorCode, message: String },
}

/// Read a request, bounded by `timeout`.
pub async fn read_request<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, wire::read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    wire::decode(&bytes)
}

/// Write a response, bounded by `timeout`.
pub async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = wire::encode(response)?;
    tokio::time::timeout(timeout, wire::write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Read a request using [`DEFAULT_TIMEOUT`].
pub async fn read_request_default<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Request, ProtocolError> {
    read_request(reader, DEFAULT_TIMEOUT).await
}

/// Write a response using [`DEFAULT_TIMEOUT`].
pub async fn write_response_default<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
) -> Result<(), ProtocolError> {
    write_response(writer, response, DEFAULT_TIMEOUT).await
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
