// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::control::ControlPlane;
use conductor_events::EventBus;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub control: Arc<dyn ControlPlane>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(control: Arc<dyn ControlPlane>, events: EventBus) -> Self {
        Self { control, events }
    }
}
