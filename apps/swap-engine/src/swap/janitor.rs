// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap State Janitor
//!
//! Background task that purges swap states past their retention window,
//! completed or not, so the store's memory stays bounded between requests.
//! Leased entries are left alone.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown, like the
//! request serializer.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::state::SwapStateStore;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct StateJanitor {
    store: Arc<SwapStateStore>,
    sweep_interval: Duration,
}

impl StateJanitor {
    pub fn new(store: Arc<SwapStateStore>) -> Self {
        Self {
            store,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(janitor.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            retention_secs = self.store.retention().as_secs(),
            "Swap state janitor starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Swap state janitor shutting down");
                    return;
                }
            }

            self.sweep();
        }
    }

    /// Purge once. Returns the number of states removed.
    pub fn sweep(&self) -> usize {
        let purged = self.store.purge_expired();
        if purged > 0 {
            info!(purged, remaining = self.store.len(), "Purged expired swap states");
        } else {
            debug!(remaining = self.store.len(), "No expired swap states");
        }
        purged
    }
}
