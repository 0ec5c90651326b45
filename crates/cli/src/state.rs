// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single piece of shared state a running instance hands to every
//! surface that can see or touch it: the HTTP push server, the IPC control
//! socket, and the orchestration loop itself. One instance drives exactly
//! one plan, so there is no plan lookup here — only the plan this process
//! was started with.

use crate::config::Config;
use conductor_core::{Clock, InstanceId, Plan, Status, SystemClock};
use conductor_events::EventBus;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct OrchestratorState {
    pub plan: Plan,
    pub plan_path: PathBuf,
    pub config: Config,
    pub status: Mutex<Status>,
    pub events: EventBus,
    pub clock: SystemClock,
    pub instance_id: InstanceId,
    paused: AtomicBool,
    shutdown: CancellationToken,
}

impl OrchestratorState {
    pub fn new(
        plan: Plan,
        plan_path: PathBuf,
        config: Config,
        status: Status,
        events: EventBus,
        instance_id: InstanceId,
    ) -> Self {
        Self {
            plan,
            plan_path,
            config,
            status: Mutex::new(status),
            events,
            clock: SystemClock,
            instance_id,
            paused: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn plan_id(&self) -> &str {
        &self.config.plan_id
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn with_status<R>(&self, f: impl FnOnce(&Status) -> R) -> R {
        let status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        f(&status)
    }

    pub fn with_status_mut<R>(&self, f: impl FnOnce(&mut Status) -> R) -> R {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut status)
    }
}
