// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory [`Ledger`] used by the engine's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;

use super::ledger::{Confirmation, Ledger, LedgerError, SubmissionError, SubmissionFailureKind};
use super::types::{NetworkConfig, FUJI};

/// Signer address every mock ledger reports.
pub const MOCK_SIGNER: Address = address!("5151515151515151515151515151515151515151");

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// `None` for native sends.
    pub asset: Option<Address>,
    pub to: Address,
    pub amount: U256,
    pub nonce: u64,
    pub tx_hash: TxHash,
}

#[derive(Default)]
struct MockState {
    native: U256,
    tokens: HashMap<Address, U256>,
    decimals: HashMap<Address, u8>,
    chain_nonce: u64,
    submissions: Vec<Submission>,
    submit_attempts: usize,
    failures: HashMap<Address, VecDeque<SubmissionFailureKind>>,
    reverting: Vec<Address>,
    unconfirmed: Vec<Address>,
    nonce_queries: usize,
    balance_error: bool,
}

pub struct MockLedger {
    network: NetworkConfig,
    state: Mutex<MockState>,
    submit_delay: Option<Duration>,
}

impl MockLedger {
    /// A Fuji-configured ledger with no funds.
    pub fn new() -> Self {
        Self {
            network: FUJI.configure(Some("http://127.0.0.1:8545".into()), &[]),
            state: Mutex::new(MockState::default()),
            submit_delay: None,
        }
    }

    /// Sleep inside every submission, to widen interleaving windows.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock ledger lock")
    }

    pub fn set_native(&self, amount: U256) {
        self.state().native = amount;
    }

    pub fn set_token(&self, token: Address, amount: U256) {
        self.state().tokens.insert(token, amount);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.state().decimals.insert(token, decimals);
    }

    /// Move the chain's nonce, as if another sender used the key.
    pub fn set_chain_nonce(&self, nonce: u64) {
        self.state().chain_nonce = nonce;
    }

    pub fn chain_nonce(&self) -> u64 {
        self.state().chain_nonce
    }

    /// Fail the next submission to `recipient` with `kind`.
    pub fn fail_next_to(&self, recipient: Address, kind: SubmissionFailureKind) {
        self.state()
            .failures
            .entry(recipient)
            .or_default()
            .push_back(kind);
    }

    /// Every transfer to `recipient` is mined with a failed receipt.
    pub fn revert_transfers_to(&self, recipient: Address) {
        self.state().reverting.push(recipient);
    }

    /// Confirmation waits for transfers to `recipient` time out, although
    /// the transfer was broadcast.
    pub fn time_out_confirmations_to(&self, recipient: Address) {
        self.state().unconfirmed.push(recipient);
    }

    /// Make balance queries fail.
    pub fn set_balance_error(&self, failing: bool) {
        self.state().balance_error = failing;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state().submissions.clone()
    }

    pub fn submit_attempts(&self) -> usize {
        self.state().submit_attempts
    }

    pub fn nonce_queries(&self) -> usize {
        self.state().nonce_queries
    }

    async fn accept(
        &self,
        asset: Option<Address>,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.submit_attempts += 1;

        if let Some(kind) = state.failures.get_mut(&to).and_then(VecDeque::pop_front) {
            return Err(SubmissionError::new(kind, format!("mock failure {kind:?}")));
        }
        if nonce != state.chain_nonce {
            return Err(SubmissionError::new(
                SubmissionFailureKind::NonceConflict,
                format!("nonce mismatch: chain {}, tx {}", state.chain_nonce, nonce),
            ));
        }

        let balance = match asset {
            None => state.native,
            Some(token) => state.tokens.get(&token).copied().unwrap_or_default(),
        };
        if balance < amount {
            return Err(SubmissionError::new(
                SubmissionFailureKind::InsufficientFunds,
                "insufficient funds",
            ));
        }
        match asset {
            None => state.native -= amount,
            Some(token) => {
                state.tokens.insert(token, balance - amount);
            }
        }

        state.chain_nonce += 1;
        let index = state.submissions.len() as u64 + 1;
        let tx_hash = TxHash::left_padding_from(&index.to_be_bytes());
        state.submissions.push(Submission {
            asset,
            to,
            amount,
            nonce,
            tx_hash,
        });
        Ok(tx_hash)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn signer_address(&self) -> Address {
        MOCK_SIGNER
    }

    async fn next_nonce(&self, _address: Address) -> Result<u64, LedgerError> {
        let mut state = self.state();
        state.nonce_queries += 1;
        Ok(state.chain_nonce)
    }

    async fn native_balance(&self, _address: Address) -> Result<U256, LedgerError> {
        let state = self.state();
        if state.balance_error {
            return Err(LedgerError::RpcError("mock balance outage".into()));
        }
        Ok(state.native)
    }

    async fn asset_balance(&self, asset: Address, _holder: Address) -> Result<U256, LedgerError> {
        let state = self.state();
        if state.balance_error {
            return Err(LedgerError::RpcError("mock balance outage".into()));
        }
        Ok(state.tokens.get(&asset).copied().unwrap_or_default())
    }

    async fn asset_decimals(&self, asset: Address) -> u8 {
        self.state().decimals.get(&asset).copied().unwrap_or(18)
    }

    async fn send_native(
        &self,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError> {
        self.accept(None, to, amount, nonce).await
    }

    async fn send_asset(
        &self,
        asset: Address,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError> {
        self.accept(Some(asset), to, amount, nonce).await
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<Confirmation, LedgerError> {
        let state = self.state();
        let submission = state
            .submissions
            .iter()
            .find(|s| s.tx_hash == tx_hash)
            .ok_or_else(|| LedgerError::RpcError("unknown transaction".into()))?;

        if state.unconfirmed.contains(&submission.to) {
            return Err(LedgerError::ConfirmationTimeout {
                tx_hash,
                confirmations,
            });
        }

        Ok(Confirmation {
            block_number: submission.nonce + 1,
            success: !state.reverting.contains(&submission.to),
        })
    }
}
