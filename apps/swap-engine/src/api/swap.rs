// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info};

use crate::{
    auth::Auth,
    models::{ExecuteSwapRequest, SwapCode, SwapResponse},
    state::AppState,
    swap::TaskFailure,
};

/// Execute, resume or replay a swap.
///
/// Every business outcome is HTTP 200; check `success` and `code`. Only a
/// missing or invalid token yields a non-200 status.
#[utoipa::path(
    post,
    path = "/execute-swap",
    tag = "Swap",
    security(("bearer_auth" = [])),
    request_body = ExecuteSwapRequest,
    responses(
        (status = 200, description = "Swap outcome", body = SwapResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn execute_swap(
    _auth: Auth,
    State(state): State<AppState>,
    body: Result<Json<ExecuteSwapRequest>, JsonRejection>,
) -> Json<SwapResponse> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return Json(SwapResponse::rejected(
                SwapCode::InvalidRequest,
                rejection.body_text(),
            ))
        }
    };

    let request = match body.validate() {
        Ok(request) => request,
        Err(message) => return Json(SwapResponse::rejected(SwapCode::InvalidRequest, message)),
    };

    if !state.engine.supports(&request.network) {
        return Json(SwapResponse::rejected(
            SwapCode::UnsupportedNetwork,
            format!("Network `{}` is not supported", request.network),
        ));
    }

    let key = request.idempotency_key.clone();
    let engine = state.engine.clone();
    let outcome = state
        .serializer
        .submit(async move { engine.execute(request).await })
        .await;

    match outcome {
        Ok(response) => Json(response),
        Err(TaskFailure::TimedOut(ceiling)) => {
            info!(idempotency_key = %key, ceiling_secs = ceiling.as_secs(), "Swap task timed out");
            Json(SwapResponse::rejected(
                SwapCode::QueueTimeout,
                "Swap did not finish in time; it may still complete, resubmit later",
            ))
        }
        Err(failure) => {
            error!(idempotency_key = %key, error = %failure, "Swap task failed");
            Json(SwapResponse::rejected(
                SwapCode::InternalError,
                "Internal error while processing swap",
            ))
        }
    }
}
