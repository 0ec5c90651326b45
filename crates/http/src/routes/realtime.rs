// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket and SSE fan-out of bus events. Both surfaces relay the same
//! payloads: one `{type:"status"}` snapshot on connect, then bus events,
//! with a `{type:"heartbeat"}` frame every 30s.

use crate::state::AppState;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use conductor_core::Event;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const SEND_BUFFER: usize = 256;

enum Frame {
    Event(Event),
    Overflow,
}

fn spawn_fanin(state: &AppState, plan_ids: Vec<String>) -> mpsc::Receiver<Frame> {
    let (tx, rx) = mpsc::channel::<Frame>(SEND_BUFFER);
    for plan_id in plan_ids {
        let mut sub = state.events.subscribe(&plan_id);
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(event) = sub.recv().await {
                if tx.try_send(Frame::Event(event)).is_err() {
                    let _ = tx.try_send(Frame::Overflow);
                    break;
                }
            }
        });
    }
    rx
}

pub async fn ws_plan(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, vec![plan_id]))
}

pub async fn ws_all(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let plan_ids = state
        .control
        .list_plans()
        .await
        .into_iter()
        .map(|p| p.plan_id)
        .collect();
    ws.on_upgrade(move |socket| handle_socket(socket, state, plan_ids))
}

async fn send_snapshot(socket: &mut WebSocket, state: &AppState, plan_ids: &[String]) -> bool {
    for plan_id in plan_ids {
        if let Some(status) = state.control.plan_status(plan_id).await {
            let frame = json!({
                "type": "status",
                "plan_id": status.plan_id,
                "current_phase": status.current_phase,
                "summary": status.summary,
                "active_tasks": status.active_tasks,
            });
            if socket.send(Message::Text(frame.to_string().into())).await.is_err() {
                return false;
            }
        }
    }
    true
}

async fn handle_socket(mut socket: WebSocket, state: AppState, plan_ids: Vec<String>) {
    if !send_snapshot(&mut socket, &state, &plan_ids).await {
        return;
    }

    let mut rx = spawn_fanin(&state, plan_ids);
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(Frame::Event(event)) => {
                        let Ok(payload) = serde_json::to_string(&event) else { continue };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            return;
                        }
                    }
                    Some(Frame::Overflow) => {
                        let close = CloseFrame {
                            code: 1008,
                            reason: "send buffer overflow".into(),
                        };
                        let _ = socket.send(Message::Close(Some(close))).await;
                        return;
                    }
                    None => return,
                }
            }
            _ = heartbeat.tick() => {
                let payload = json!({"type": "heartbeat"}).to_string();
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    return;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
        }
    }
}

/// `GET /api/plans/{id}/logs-sse`: only `worker.stdout` lines (plus
/// heartbeats), formatted as the logs-sse payload shape.
pub async fn logs_sse(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = spawn_fanin(&state, vec![plan_id]);
    let stream = ReceiverStream::new(rx).filter_map(|frame| match frame {
        Frame::Event(event) => match event.payload {
            conductor_core::EventPayload::WorkerStdout { line, .. } => {
                Some(Ok(SseEvent::default().json_data(json!({"type": "log", "content": line})).ok()?))
            }
            _ => None,
        },
        Frame::Overflow => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text(
        json!({"type": "heartbeat"}).to_string(),
    ))
}

/// `GET /api/plans/{id}/events-sse`: every bus event for the plan.
pub async fn events_sse(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = spawn_fanin(&state, vec![plan_id]);
    let stream = ReceiverStream::new(rx).filter_map(|frame| match frame {
        Frame::Event(event) => SseEvent::default().json_data(event).ok().map(Ok),
        Frame::Overflow => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text(
        json!({"type": "heartbeat"}).to_string(),
    ))
}

#[cfg(test)]
#[path = "realtime_tests.rs"]
mod tests;
