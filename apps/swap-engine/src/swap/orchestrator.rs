// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Orchestrator
//!
//! Drives a swap's steps against the state store:
//!
//! 1. A completed swap replays its stored response.
//! 2. A new swap gets a plan (minor-unit amounts and fees) and a state with
//!    every step pending.
//! 3. Both payouts are attempted, skipping steps already terminal.
//! 4. Only when both payouts are terminal does the fee step run, sending the
//!    treasury share of each side's fee.
//! 5. When every step is terminal the swap is marked completed.
//!
//! Each step result is persisted as soon as it is known, so a retry resumes
//! where the previous attempt stopped.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{error, info, warn};

use crate::blockchain::{parse_amount, AmountError, Ledger};
use crate::models::{SwapCode, SwapResponse};

use super::executor::TransferExecutor;
use super::state::{StoreError, SwapState, SwapStateStore};
use super::types::{FailureKind, SwapPlan, SwapRequest, TransferStatus};

/// Swap engine: one executor per enabled network over a shared state store.
pub struct SwapEngine {
    store: Arc<SwapStateStore>,
    executors: HashMap<String, TransferExecutor>,
    treasury: Address,
}

impl SwapEngine {
    pub fn new(store: Arc<SwapStateStore>, treasury: Address) -> Self {
        Self {
            store,
            executors: HashMap::new(),
            treasury,
        }
    }

    /// Enable the ledger's network.
    pub fn with_network(mut self, ledger: Arc<dyn Ledger>, gas_reserve: U256) -> Self {
        let id = ledger.network().id.clone();
        self.executors
            .insert(id, TransferExecutor::new(ledger, gas_reserve));
        self
    }

    pub fn store(&self) -> &Arc<SwapStateStore> {
        &self.store
    }

    /// Enabled network identifiers, sorted.
    pub fn network_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.executors.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn supports(&self, network: &str) -> bool {
        self.executors.contains_key(network)
    }

    /// Run (or resume, or replay) the swap named by `request.idempotency_key`.
    pub async fn execute(&self, request: SwapRequest) -> SwapResponse {
        let key = request.idempotency_key.clone();

        let Some(executor) = self.executors.get(&request.network) else {
            info!(idempotency_key = %key, network = %request.network, "Unsupported network");
            return SwapResponse::rejected(
                SwapCode::UnsupportedNetwork,
                format!("Network `{}` is not supported", request.network),
            );
        };

        let Some(_lease) = self.store.try_lease(&key) else {
            info!(idempotency_key = %key, "Swap already in progress");
            return SwapResponse::rejected(
                SwapCode::InProgress,
                "Swap is already being processed, retry later",
            );
        };

        let mut state = match self.store.get(&key) {
            Some(state) if state.request != request => {
                warn!(idempotency_key = %key, "Idempotency key reused with a different payload");
                return SwapResponse::rejected(
                    SwapCode::IdempotencyConflict,
                    "Idempotency key was already used for a different swap",
                );
            }
            Some(state) if state.completed => {
                info!(idempotency_key = %key, "Replaying completed swap");
                return state.outcome.clone().unwrap_or_else(|| {
                    SwapResponse::from_state(&state, None, "Swap executed successfully")
                });
            }
            Some(state) => {
                info!(idempotency_key = %key, phase = ?state.phase(), "Resuming swap");
                state
            }
            None => {
                let plan = match self.plan(executor, &request).await {
                    Ok(plan) => plan,
                    Err(e) => {
                        info!(idempotency_key = %key, error = %e, "Rejecting swap with invalid amount");
                        return SwapResponse::rejected(SwapCode::InvalidRequest, e.to_string());
                    }
                };
                info!(
                    idempotency_key = %key,
                    network = %request.network,
                    fee_bps = plan.fees.rate_bps,
                    buyer_net = %plan.fees.buyer_net,
                    seller_net = %plan.fees.seller_net,
                    "Starting swap"
                );
                let state = SwapState::new(request, plan);
                match self.store.insert_new(state.clone()) {
                    Ok(()) => {}
                    Err(StoreError::AtCapacity) => {
                        warn!(idempotency_key = %key, "Swap state store full, deferring new swap");
                        return SwapResponse::rejected(
                            SwapCode::RetryLater,
                            "Too many swaps in flight; resubmit later",
                        );
                    }
                    Err(e) => {
                        error!(idempotency_key = %key, error = %e, "Failed to record new swap");
                        return SwapResponse::rejected(SwapCode::InternalError, e.to_string());
                    }
                }
                state
            }
        };

        self.drive(executor, &mut state).await
    }

    /// Resolve both gross amounts to minor units and lay out the transfers.
    async fn plan(
        &self,
        executor: &TransferExecutor,
        request: &SwapRequest,
    ) -> Result<SwapPlan, AmountError> {
        let ledger = executor.ledger();
        let seller_decimals = ledger.decimals_of(&request.seller_token).await;
        let buyer_decimals = ledger.decimals_of(&request.buyer_token).await;

        let buyer_gross = parse_amount(&request.seller_amount, seller_decimals)?;
        let seller_gross = parse_amount(&request.buyer_amount, buyer_decimals)?;

        Ok(SwapPlan::new(request, buyer_gross, seller_gross, self.treasury))
    }

    async fn drive(&self, executor: &TransferExecutor, state: &mut SwapState) -> SwapResponse {
        if !state.buyer_transfer.is_terminal() {
            state.buyer_transfer = executor.execute(&state.plan.buyer_payout).await;
            self.persist(state);
        }
        if !state.seller_transfer.is_terminal() {
            state.seller_transfer = executor.execute(&state.plan.seller_payout).await;
            self.persist(state);
        }
        if !state.primaries_terminal() {
            return halted(state, &[&state.buyer_transfer, &state.seller_transfer]);
        }

        if !state.fee_transfer.buyer_side.is_terminal() {
            state.fee_transfer.buyer_side = executor.execute(&state.plan.buyer_side_fee).await;
            self.persist(state);
        }
        if !state.fee_transfer.seller_side.is_terminal() {
            state.fee_transfer.seller_side = executor.execute(&state.plan.seller_side_fee).await;
            self.persist(state);
        }
        if !state.fee_transfer.is_terminal() {
            return halted(
                state,
                &[&state.fee_transfer.buyer_side, &state.fee_transfer.seller_side],
            );
        }

        state.completed = true;
        let response = SwapResponse::from_state(state, None, "Swap executed successfully");
        state.outcome = Some(response.clone());
        self.persist(state);

        info!(idempotency_key = %state.key(), "Swap completed");
        response
    }

    fn persist(&self, state: &SwapState) {
        if let Err(e) = self.store.save(state.clone()) {
            error!(idempotency_key = %state.key(), error = %e, "Failed to persist swap state");
        }
    }
}

/// Report a swap that stopped on non-terminal steps.
///
/// Precedence: out of gas, then other failures, then waiting for funds,
/// then transient.
fn halted(state: &SwapState, steps: &[&TransferStatus]) -> SwapResponse {
    let failure = |wanted: fn(FailureKind) -> bool| {
        steps
            .iter()
            .any(|s| s.failure().is_some_and(wanted))
    };

    let (code, message) = if failure(|k| k == FailureKind::OutOfGas) {
        (
            SwapCode::OutOfGas,
            "Signer native balance is below the gas reserve",
        )
    } else if failure(|_| true) {
        (
            SwapCode::TransferFailed,
            "A transfer failed; completed steps are kept and the swap can be resubmitted",
        )
    } else if steps
        .iter()
        .any(|s| matches!(s, TransferStatus::WaitingForFunds))
    {
        (
            SwapCode::WaitingForFunds,
            "Waiting for funds to arrive; resubmit later",
        )
    } else {
        (
            SwapCode::RetryLater,
            "Ledger temporarily unavailable; resubmit later",
        )
    };

    info!(idempotency_key = %state.key(), code = ?code, phase = ?state.phase(), "Swap halted");
    SwapResponse::from_state(state, Some(code), message)
}
