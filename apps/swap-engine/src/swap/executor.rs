// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transfer Executor
//!
//! Performs one funded, balance-checked, nonce-assigned asset movement and
//! classifies the outcome into a [`TransferStatus`].
//!
//! ## Flow
//!
//! 1. Zero amounts and transfers to the signer itself are skipped without
//!    touching the ledger.
//! 2. The signer's native balance must cover the gas reserve, otherwise the
//!    step fails with `OutOfGas` and no nonce is used.
//! 3. The balance of the asset being sent must cover the amount (plus the
//!    gas reserve for native sends), otherwise the step is `WaitingForFunds`.
//! 4. A nonce is reserved, the transfer submitted and one confirmation
//!    awaited.
//!
//! After any submission failure the nonce counter is resynchronized from the
//! network before the lock is released.

use std::sync::Arc;

use alloy::primitives::{TxHash, U256};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::blockchain::{AssetKind, Ledger, SubmissionError, SubmissionFailureKind};

use super::nonce::NonceTracker;
use super::types::{FailureKind, PlannedTransfer, SkipReason, TransferStatus};

/// Executes transfers for one network with the custodial signer.
pub struct TransferExecutor {
    ledger: Arc<dyn Ledger>,
    nonce: Mutex<NonceTracker>,
    gas_reserve: U256,
    confirmations: u64,
}

impl TransferExecutor {
    pub fn new(ledger: Arc<dyn Ledger>, gas_reserve: U256) -> Self {
        let nonce = Mutex::new(NonceTracker::new(ledger.signer_address()));
        Self {
            ledger,
            nonce,
            gas_reserve,
            confirmations: 1,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Execute `transfer` and report its status. Never fails: every ledger
    /// condition maps onto a status.
    pub async fn execute(&self, transfer: &PlannedTransfer) -> TransferStatus {
        let network = &self.ledger.network().id;
        let signer = self.ledger.signer_address();

        if transfer.amount.is_zero() {
            info!(network = %network, label = %transfer.label, "Skipping zero-amount transfer");
            return TransferStatus::Skipped {
                reason: SkipReason::ZeroAmount,
            };
        }
        if transfer.recipient == signer {
            info!(network = %network, label = %transfer.label, "Skipping transfer to signer");
            return TransferStatus::Skipped {
                reason: SkipReason::SelfTransfer,
            };
        }

        let kind = transfer.asset.resolve(self.ledger.network());

        let native = match self.ledger.native_balance(signer).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(network = %network, label = %transfer.label, error = %e, "Native balance query failed");
                return TransferStatus::Pending;
            }
        };
        if native < self.gas_reserve {
            error!(
                network = %network,
                label = %transfer.label,
                balance = %native,
                reserve = %self.gas_reserve,
                "Signer native balance below gas reserve"
            );
            return TransferStatus::Failed {
                kind: FailureKind::OutOfGas,
            };
        }

        let (available, required) = match kind {
            AssetKind::Native | AssetKind::WrappedNative(_) => {
                (native, transfer.amount.saturating_add(self.gas_reserve))
            }
            AssetKind::Token(token) => match self.ledger.asset_balance(token, signer).await {
                Ok(balance) => (balance, transfer.amount),
                Err(e) => {
                    warn!(network = %network, label = %transfer.label, error = %e, "Asset balance query failed");
                    return TransferStatus::Pending;
                }
            },
        };
        if available < required {
            info!(
                network = %network,
                label = %transfer.label,
                available = %available,
                required = %required,
                "Waiting for funds"
            );
            return TransferStatus::WaitingForFunds;
        }

        let tx_hash = match self.submit(transfer, kind).await {
            Ok(tx_hash) => tx_hash,
            Err(status) => return status,
        };

        match self
            .ledger
            .await_confirmation(tx_hash, self.confirmations)
            .await
        {
            Ok(confirmation) if confirmation.success => {
                info!(
                    network = %network,
                    label = %transfer.label,
                    tx_hash = %tx_hash,
                    block = confirmation.block_number,
                    explorer = %self.ledger.network().explorer_tx_url(&tx_hash.to_string()),
                    "Transfer confirmed"
                );
                TransferStatus::Submitted { tx_hash }
            }
            Ok(confirmation) => {
                error!(
                    network = %network,
                    label = %transfer.label,
                    tx_hash = %tx_hash,
                    block = confirmation.block_number,
                    "Transfer reverted"
                );
                TransferStatus::Failed {
                    kind: FailureKind::Reverted,
                }
            }
            Err(e) => {
                // Broadcast already happened; resending would double-pay.
                warn!(
                    network = %network,
                    label = %transfer.label,
                    tx_hash = %tx_hash,
                    error = %e,
                    "Confirmation wait failed, recording transfer as submitted"
                );
                TransferStatus::Submitted { tx_hash }
            }
        }
    }

    /// Reserve a nonce and broadcast. The nonce lock is held until the
    /// submission either succeeds or the counter is resynced.
    async fn submit(
        &self,
        transfer: &PlannedTransfer,
        kind: AssetKind,
    ) -> Result<TxHash, TransferStatus> {
        let network = &self.ledger.network().id;
        let mut tracker = self.nonce.lock().await;

        let nonce = tracker.reserve(self.ledger.as_ref()).await.map_err(|e| {
            warn!(network = %network, label = %transfer.label, error = %e, "Nonce query failed");
            TransferStatus::Pending
        })?;

        let result = match kind {
            AssetKind::Native | AssetKind::WrappedNative(_) => {
                self.ledger
                    .send_native(transfer.recipient, transfer.amount, nonce)
                    .await
            }
            AssetKind::Token(token) => {
                self.ledger
                    .send_asset(token, transfer.recipient, transfer.amount, nonce)
                    .await
            }
        };

        match result {
            Ok(tx_hash) => {
                info!(
                    network = %network,
                    label = %transfer.label,
                    recipient = %transfer.recipient,
                    amount = %transfer.amount,
                    nonce,
                    tx_hash = %tx_hash,
                    "Transfer submitted"
                );
                Ok(tx_hash)
            }
            Err(err) => {
                if let Err(e) = tracker.resync(self.ledger.as_ref()).await {
                    warn!(network = %network, error = %e, "Nonce resync failed, will reload on next reservation");
                }
                Err(classify_submission_failure(transfer, nonce, &err))
            }
        }
    }
}

fn classify_submission_failure(
    transfer: &PlannedTransfer,
    nonce: u64,
    err: &SubmissionError,
) -> TransferStatus {
    match err.kind {
        SubmissionFailureKind::InsufficientFunds => {
            info!(label = %transfer.label, nonce, error = %err.message, "Ledger reported insufficient funds");
            TransferStatus::WaitingForFunds
        }
        SubmissionFailureKind::NonceConflict | SubmissionFailureKind::Transient => {
            warn!(label = %transfer.label, nonce, kind = ?err.kind, error = %err.message, "Retryable submission failure");
            TransferStatus::Pending
        }
        SubmissionFailureKind::Fatal => {
            error!(label = %transfer.label, nonce, error = %err.message, "Submission rejected");
            TransferStatus::Failed {
                kind: FailureKind::Fatal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::{MockLedger, MOCK_SIGNER};
    use crate::blockchain::{AssetId, FUJI};
    use crate::swap::types::TransferLabel;
    use alloy::primitives::{address, Address};

    const USDC: Address = address!("5425890298aed601595a70AB815c96711a31Bc65");
    const RECIPIENT: Address = address!("00000000000000000000000000000000000000b1");
    const RESERVE: u64 = 1_000;

    fn setup() -> (Arc<MockLedger>, TransferExecutor) {
        let ledger = Arc::new(MockLedger::new());
        let executor = TransferExecutor::new(ledger.clone(), U256::from(RESERVE));
        (ledger, executor)
    }

    fn token_transfer(amount: u64) -> PlannedTransfer {
        PlannedTransfer {
            label: TransferLabel::BuyerPayout,
            asset: AssetId::Contract(USDC),
            recipient: RECIPIENT,
            amount: U256::from(amount),
        }
    }

    fn funded() -> (Arc<MockLedger>, TransferExecutor) {
        let (ledger, executor) = setup();
        ledger.set_native(U256::from(RESERVE * 10));
        ledger.set_token(USDC, U256::from(1_000u64));
        (ledger, executor)
    }

    #[tokio::test]
    async fn zero_amount_and_self_transfer_are_skipped() {
        let (ledger, executor) = setup();

        let status = executor.execute(&token_transfer(0)).await;
        assert_eq!(
            status,
            TransferStatus::Skipped {
                reason: SkipReason::ZeroAmount
            }
        );

        let mut to_self = token_transfer(10);
        to_self.recipient = MOCK_SIGNER;
        let status = executor.execute(&to_self).await;
        assert_eq!(
            status,
            TransferStatus::Skipped {
                reason: SkipReason::SelfTransfer
            }
        );

        assert_eq!(ledger.nonce_queries(), 0);
        assert_eq!(ledger.submit_attempts(), 0);
    }

    #[tokio::test]
    async fn below_gas_reserve_is_out_of_gas_without_nonce() {
        let (ledger, executor) = setup();
        ledger.set_native(U256::from(RESERVE - 1));
        ledger.set_token(USDC, U256::from(1_000u64));

        let status = executor.execute(&token_transfer(10)).await;
        assert_eq!(
            status,
            TransferStatus::Failed {
                kind: FailureKind::OutOfGas
            }
        );
        assert_eq!(ledger.nonce_queries(), 0);
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn short_token_balance_waits_for_funds() {
        let (ledger, executor) = funded();
        ledger.set_chain_nonce(4);

        let status = executor.execute(&token_transfer(1_001)).await;
        assert_eq!(status, TransferStatus::WaitingForFunds);
        assert!(ledger.submissions().is_empty());
        assert_eq!(ledger.nonce_queries(), 0);
        assert_eq!(ledger.chain_nonce(), 4);
    }

    #[tokio::test]
    async fn native_send_keeps_gas_reserve() {
        let (ledger, executor) = setup();
        ledger.set_native(U256::from(RESERVE + 99));

        let transfer = PlannedTransfer {
            asset: AssetId::Native,
            ..token_transfer(100)
        };
        assert_eq!(
            executor.execute(&transfer).await,
            TransferStatus::WaitingForFunds
        );

        ledger.set_native(U256::from(RESERVE + 100));
        assert!(matches!(
            executor.execute(&transfer).await,
            TransferStatus::Submitted { .. }
        ));
    }

    #[tokio::test]
    async fn nonce_advances_by_one_per_submission() {
        let (ledger, executor) = funded();
        ledger.set_chain_nonce(3);

        let first = executor.execute(&token_transfer(10)).await;
        let second = executor.execute(&token_transfer(20)).await;

        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].nonce, 3);
        assert_eq!(submissions[1].nonce, 4);
        assert_eq!(first.tx_hash(), Some(submissions[0].tx_hash));
        assert_eq!(second.tx_hash(), Some(submissions[1].tx_hash));
        assert_eq!(ledger.nonce_queries(), 1);
    }

    #[tokio::test]
    async fn insufficient_funds_on_chain_waits_and_resyncs() {
        let (ledger, executor) = funded();
        ledger.fail_next_to(RECIPIENT, SubmissionFailureKind::InsufficientFunds);

        let status = executor.execute(&token_transfer(10)).await;
        assert_eq!(status, TransferStatus::WaitingForFunds);
        // reserve + resync
        assert_eq!(ledger.nonce_queries(), 2);

        executor.execute(&token_transfer(10)).await;
        assert_eq!(ledger.submissions()[0].nonce, 0);
    }

    #[tokio::test]
    async fn transient_and_fatal_failures() {
        let (ledger, executor) = funded();

        ledger.fail_next_to(RECIPIENT, SubmissionFailureKind::Transient);
        assert_eq!(
            executor.execute(&token_transfer(10)).await,
            TransferStatus::Pending
        );

        ledger.fail_next_to(RECIPIENT, SubmissionFailureKind::Fatal);
        assert_eq!(
            executor.execute(&token_transfer(10)).await,
            TransferStatus::Failed {
                kind: FailureKind::Fatal
            }
        );
        assert!(ledger.submissions().is_empty());
    }

    #[tokio::test]
    async fn nonce_conflict_resyncs_to_network_value() {
        let (ledger, executor) = funded();

        executor.execute(&token_transfer(10)).await;
        assert_eq!(ledger.chain_nonce(), 1);

        // Another sender used the key behind our back.
        ledger.set_chain_nonce(5);
        assert_eq!(
            executor.execute(&token_transfer(10)).await,
            TransferStatus::Pending
        );

        executor.execute(&token_transfer(10)).await;
        let nonces: Vec<u64> = ledger.submissions().iter().map(|s| s.nonce).collect();
        assert_eq!(nonces, vec![0, 5]);
    }

    #[tokio::test]
    async fn wrapped_native_is_delivered_as_native() {
        let (ledger, executor) = setup();
        ledger.set_native(U256::from(RESERVE * 10));
        let wavax = FUJI.wrapped_native[0];

        let transfer = PlannedTransfer {
            asset: AssetId::Contract(wavax),
            ..token_transfer(500)
        };
        assert!(matches!(
            executor.execute(&transfer).await,
            TransferStatus::Submitted { .. }
        ));

        let submissions = ledger.submissions();
        assert_eq!(submissions[0].asset, None);
        assert_eq!(submissions[0].amount, U256::from(500u64));
    }

    #[tokio::test]
    async fn reverted_receipt_is_a_failure() {
        let (ledger, executor) = funded();
        ledger.revert_transfers_to(RECIPIENT);

        assert_eq!(
            executor.execute(&token_transfer(10)).await,
            TransferStatus::Failed {
                kind: FailureKind::Reverted
            }
        );
        assert_eq!(ledger.submissions().len(), 1);
    }

    #[tokio::test]
    async fn unconfirmed_broadcast_is_recorded_as_submitted() {
        let (ledger, executor) = funded();
        ledger.time_out_confirmations_to(RECIPIENT);

        let status = executor.execute(&token_transfer(10)).await;
        let submissions = ledger.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            status,
            TransferStatus::Submitted {
                tx_hash: submissions[0].tx_hash
            }
        );
    }

    #[tokio::test]
    async fn balance_outage_leaves_step_pending() {
        let (ledger, executor) = funded();
        ledger.set_balance_error(true);

        assert_eq!(
            executor.execute(&token_transfer(10)).await,
            TransferStatus::Pending
        );
        assert_eq!(ledger.nonce_queries(), 0);
    }
}
