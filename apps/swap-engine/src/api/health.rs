// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness plus queue and store occupancy.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Queued plus running swap tasks.
    pub queue_depth: usize,
    /// Whether a swap task is running.
    pub busy: bool,
    /// Swaps currently held in the state store.
    pub tracked_swaps: usize,
    /// Enabled network identifiers.
    pub networks: Vec<String>,
}

/// Health check endpoint handler. Unauthenticated.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        queue_depth: state.serializer.depth(),
        busy: state.serializer.is_busy(),
        tracked_swaps: state.store().len(),
        networks: state.engine.network_ids(),
    })
}
