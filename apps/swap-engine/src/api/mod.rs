// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CacheClearedResponse, ExecuteSwapRequest, FeeSteps, SwapCode, SwapResponse, SwapSteps,
        SwapTransactions,
    },
    state::AppState,
    swap::{FailureKind, SkipReason, SwapPhase, TransferStatus},
};

pub mod cache;
pub mod health;
pub mod swap;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/execute-swap", post(swap::execute_swap))
        .route("/cache/{idempotency_key}", delete(cache::clear_swap_state))
        .route("/health", get(health::health))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        swap::execute_swap,
        cache::clear_swap_state,
        health::health
    ),
    components(
        schemas(
            ExecuteSwapRequest,
            SwapResponse,
            SwapTransactions,
            SwapSteps,
            FeeSteps,
            SwapCode,
            SwapPhase,
            TransferStatus,
            SkipReason,
            FailureKind,
            CacheClearedResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Swap", description = "Swap execution"),
        (name = "Operator", description = "Operator escape hatches"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use alloy::primitives::{address, Address, U256};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::auth::ApiToken;
    use crate::blockchain::mock::MockLedger;
    use crate::swap::{RequestSerializer, SwapEngine, SwapStateStore};

    const TOKEN: &str = "test-token";
    const TOKEN_A: Address = address!("000000000000000000000000000000000000aaaa");
    const TOKEN_B: Address = address!("000000000000000000000000000000000000bbbb");

    fn app() -> (Router, AppState, Arc<MockLedger>) {
        app_with(MockLedger::new(), Duration::from_secs(30))
    }

    fn app_with(ledger: MockLedger, ceiling: Duration) -> (Router, AppState, Arc<MockLedger>) {
        ledger.set_decimals(TOKEN_A, 0);
        ledger.set_decimals(TOKEN_B, 0);
        ledger.set_native(U256::from(1_000_000u64));
        ledger.set_token(TOKEN_A, U256::from(1_000u64));
        ledger.set_token(TOKEN_B, U256::from(1_000u64));
        let ledger = Arc::new(ledger);

        let store = Arc::new(SwapStateStore::new(64, Duration::from_secs(1800)));
        let engine = SwapEngine::new(store, address!("0000000000000000000000000000000000007777"))
            .with_network(ledger.clone(), U256::from(1_000u64));
        let serializer = RequestSerializer::start(ceiling, CancellationToken::new());
        let state = AppState::new(Arc::new(engine), serializer, ApiToken::new(TOKEN));

        (router(state.clone()), state, ledger)
    }

    fn swap_body(key: &str) -> Value {
        json!({
            "buyerAddress": "0x00000000000000000000000000000000000000b1",
            "sellerAddress": "0x00000000000000000000000000000000000000a1",
            "buyerAmount": "100",
            "buyerToken": format!("{TOKEN_B}"),
            "sellerAmount": "200",
            "sellerToken": format!("{TOKEN_A}"),
            "network": "fuji",
            "feePercent": 10,
            "idempotencyKey": key
        })
    }

    fn post_swap(body: String, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/execute-swap")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn delete_cache(key: &str) -> Request<Body> {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/cache/{key}"))
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn swap_requires_valid_token() {
        let (app, _, ledger) = app();

        let response = app
            .clone()
            .oneshot(post_swap(swap_body("k1").to_string(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(post_swap(swap_body("k1").to_string(), Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "invalid_token");
        assert_eq!(ledger.submit_attempts(), 0);
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _, _) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["queueDepth"], 0);
        assert_eq!(body["busy"], false);
        assert_eq!(body["trackedSwaps"], 0);
        assert_eq!(body["networks"], json!(["fuji"]));
    }

    #[tokio::test]
    async fn malformed_body_is_answered_in_band() {
        let (app, _, _) = app();

        let response = app
            .clone()
            .oneshot(post_swap("{".to_string(), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let mut missing = swap_body("k1");
        missing.as_object_mut().unwrap().remove("buyerToken");
        let response = app
            .oneshot(post_swap(missing.to_string(), Some(TOKEN)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert_eq!(body["message"], "buyerToken is required");
    }

    #[tokio::test]
    async fn unsupported_network_is_answered_in_band() {
        let (app, _, _) = app();
        let mut body = swap_body("k1");
        body["network"] = json!("ethereum");

        let response = app
            .oneshot(post_swap(body.to_string(), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["code"], "UNSUPPORTED_NETWORK");
    }

    #[tokio::test]
    async fn swap_then_clear_cache() {
        let (app, _, ledger) = app();

        let response = app
            .clone()
            .oneshot(post_swap(swap_body("k1").to_string(), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true, "{body}");
        assert!(body.get("code").is_none());
        assert!(body["transactions"]["transfer1"].is_string());
        assert!(body["transactions"]["transfer4"].is_string());
        assert_eq!(body["steps"]["phase"], "completed");
        assert_eq!(ledger.submissions().len(), 4);

        let response = app.clone().oneshot(delete_cache("k1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["cleared"], true);

        let response = app.oneshot(delete_cache("k1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_swap_keeps_running_and_replays_later() {
        let (app, state, ledger) = app_with(
            MockLedger::new().with_submit_delay(Duration::from_secs(1)),
            Duration::from_millis(500),
        );

        let response = app
            .clone()
            .oneshot(post_swap(swap_body("k1").to_string(), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "QUEUE_TIMEOUT");

        // The detached task still drives the swap.
        assert!(state.store().is_leased("k1"));
        let response = app
            .clone()
            .oneshot(post_swap(swap_body("k1").to_string(), Some(TOKEN)))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["code"], "IN_PROGRESS");

        while state.store().is_leased("k1") {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(ledger.submissions().len(), 4);

        let response = app
            .oneshot(post_swap(swap_body("k1").to_string(), Some(TOKEN)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], true, "{body}");
        assert_eq!(body["steps"]["phase"], "completed");
        assert_eq!(ledger.submissions().len(), 4);
    }

    #[tokio::test]
    async fn clearing_a_running_swap_conflicts() {
        let (app, state, _) = app();
        let _lease = state.store().try_lease("k1").unwrap();

        let response = app.oneshot(delete_cache("k1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn openapi_documents_all_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/execute-swap"));
        assert!(doc.paths.paths.contains_key("/cache/{idempotency_key}"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
