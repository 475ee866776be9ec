// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::CacheClearedResponse,
    state::AppState,
    swap::StoreError,
};

/// Force-clear the stored state of one swap.
///
/// Operator escape hatch: the next submission with this key starts from
/// scratch. Refused while a task is driving the key.
#[utoipa::path(
    delete,
    path = "/cache/{idempotency_key}",
    tag = "Operator",
    security(("bearer_auth" = [])),
    params(
        ("idempotency_key" = String, Path, description = "Idempotency key of the swap")
    ),
    responses(
        (status = 200, description = "State cleared", body = CacheClearedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No state for this key"),
        (status = 409, description = "Swap is being processed")
    )
)]
pub async fn clear_swap_state(
    _auth: Auth,
    State(state): State<AppState>,
    Path(idempotency_key): Path<String>,
) -> Result<Json<CacheClearedResponse>, ApiError> {
    match state.store().remove(&idempotency_key) {
        Ok(true) => {
            tracing::warn!(idempotency_key = %idempotency_key, "Swap state cleared by operator");
            Ok(Json(CacheClearedResponse {
                idempotency_key,
                cleared: true,
            }))
        }
        Ok(false) => Err(ApiError::not_found(format!(
            "No swap state for key `{idempotency_key}`"
        ))),
        Err(StoreError::Leased) => Err(ApiError::conflict(format!(
            "Swap `{idempotency_key}` is being processed"
        ))),
        Err(e) => Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
