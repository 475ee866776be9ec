// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use relational_swap_engine::{
    api::router,
    auth::ApiToken,
    blockchain::{signer_from_secret, EvmLedger},
    config::{EngineConfig, LogFormat},
    logging::init_tracing,
    state::AppState,
    swap::{RequestSerializer, StateJanitor, SwapEngine, SwapStateStore},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    init_tracing(LogFormat::from_env());

    let config = EngineConfig::from_env().expect("Invalid configuration");
    info!(?config, "Loaded configuration");

    let signer = signer_from_secret(&config.signer_key).expect("Invalid signer key");
    info!(signer = %signer.address(), "Loaded custodial signer");

    let store = Arc::new(SwapStateStore::new(
        config.state_capacity,
        config.state_retention,
    ));
    let mut engine = SwapEngine::new(store.clone(), config.treasury);
    for network in &config.networks {
        let ledger = EvmLedger::connect(
            network.clone(),
            signer.clone(),
            config.confirmation_timeout,
        )
        .expect("Failed to create network client");
        info!(network = %network.id, chain_id = network.chain_id, "Enabled network");
        engine = engine.with_network(Arc::new(ledger), config.gas_reserve);
    }

    let shutdown = CancellationToken::new();
    let serializer = RequestSerializer::start(config.task_timeout, shutdown.clone());
    tokio::spawn(StateJanitor::new(store).run(shutdown.clone()));

    let state = AppState::new(
        Arc::new(engine),
        serializer,
        ApiToken::new(&config.api_token),
    );
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, "Swap engine listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    info!("Swap engine stopped");
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
