// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dto::Health;
use axum::Json;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
