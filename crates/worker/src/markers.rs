// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the small structured marker vocabulary workers may emit on
//! stdout. Anything that doesn't match is forwarded as a plain line.

use crate::adapter::WorkerEvent;
use conductor_core::TaskId;

/// Parse one line of worker stdout into a [`WorkerEvent`].
pub fn parse_line(line: &str) -> WorkerEvent {
    let trimmed = line.trim_end();

    if let Some(rest) = trimmed.strip_prefix("TASK_BEGIN ") {
        let id = rest.trim();
        if !id.is_empty() {
            return WorkerEvent::TaskBegin {
                task_id: TaskId::new(id),
            };
        }
    }

    if let Some(rest) = trimmed.strip_prefix("TASK_END ") {
        let mut parts = rest.splitn(3, ' ');
        if let (Some(id), Some(verdict)) = (parts.next(), parts.next()) {
            let ok = match verdict {
                "ok" => Some(true),
                "err" => Some(false),
                _ => None,
            };
            if let Some(ok) = ok {
                let message = parts.next().map(|s| s.to_string()).filter(|s| !s.is_empty());
                return WorkerEvent::TaskEnd {
                    task_id: TaskId::new(id),
                    ok,
                    message,
                };
            }
        }
    }

    if let Some(name) = trimmed.strip_prefix("TOOL_USE ") {
        let name = name.trim();
        if !name.is_empty() {
            return WorkerEvent::ToolUse {
                name: name.to_string(),
            };
        }
    }

    WorkerEvent::Line(trimmed.to_string())
}

#[cfg(test)]
#[path = "markers_tests.rs"]
mod tests;
