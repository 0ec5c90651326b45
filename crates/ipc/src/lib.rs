// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format and request/response vocabulary for the per-instance control
//! socket: a 4-byte big-endian length prefix followed by a JSON payload,
//! narrowed to the six operations a running instance accepts.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod error;
mod protocol;
mod wire;

pub use error::ProtocolError;
pub use protocol::{
    read_request, read_request_default, write_response, write_response_default, ErrorCode,
    Request, Response,
};
pub use wire::{decode, encode, read_message, write_message, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE};
