// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry document and its per-plan entries.

use chrono::{DateTime, Utc};
use conductor_core::InstanceId;
use serde::{Deserialize, Serialize};

/// One running orchestrator instance for one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub plan_id: String,
    pub instance_id: InstanceId,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

/// The full registry document: one entry per plan currently claimed by a
/// running instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn entry_for(&self, plan_id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.plan_id == plan_id)
    }
}
