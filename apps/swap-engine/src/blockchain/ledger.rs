// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The ledger boundary.
//!
//! [`Ledger`] is the only surface through which the swap engine talks to a
//! network. All amounts crossing it are integer minor units. Submission
//! failures are classified exactly once, here, into [`SubmissionFailureKind`];
//! nothing above this module inspects provider error text.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use super::types::{AssetId, NetworkConfig, NATIVE_DECIMALS};

/// Errors from ledger queries (balances, nonces, receipts).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Timed out waiting for {confirmations} confirmation(s) of {tx_hash}")]
    ConfirmationTimeout { tx_hash: TxHash, confirmations: u64 },
}

/// Closed classification of a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionFailureKind {
    /// The chain rejected the transfer for lack of funds.
    InsufficientFunds,
    /// The nonce was already used or is ahead of the chain.
    NonceConflict,
    /// Network trouble or rate limiting; safe to retry.
    Transient,
    /// Anything else. Surfaced to the caller.
    Fatal,
}

/// A failed `send_native` / `send_asset`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct SubmissionError {
    pub kind: SubmissionFailureKind,
    pub message: String,
}

impl SubmissionError {
    pub fn new(kind: SubmissionFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build from a JSON-RPC error message.
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(classify_rpc_message(&message), message)
    }
}

/// Classify a JSON-RPC error message.
///
/// Geth, Avalanche, BSC and the common hosted providers agree on these
/// phrasings closely enough that substring checks are reliable.
pub fn classify_rpc_message(message: &str) -> SubmissionFailureKind {
    let msg = message.to_ascii_lowercase();

    const INSUFFICIENT: &[&str] = &[
        "insufficient funds",
        "insufficient balance",
        "exceeds balance",
        "transfer amount exceeds",
    ];
    const NONCE: &[&str] = &[
        "nonce too low",
        "nonce too high",
        "already known",
        "replacement transaction underpriced",
        "invalid nonce",
    ];
    const TRANSIENT: &[&str] = &[
        "timeout",
        "timed out",
        "connection",
        "rate limit",
        "too many requests",
        "429",
        "502",
        "503",
        "504",
        "temporarily unavailable",
        "header not found",
    ];

    if INSUFFICIENT.iter().any(|p| msg.contains(p)) {
        SubmissionFailureKind::InsufficientFunds
    } else if NONCE.iter().any(|p| msg.contains(p)) {
        SubmissionFailureKind::NonceConflict
    } else if TRANSIENT.iter().any(|p| msg.contains(p)) {
        SubmissionFailureKind::Transient
    } else {
        SubmissionFailureKind::Fatal
    }
}

/// Outcome of waiting for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub block_number: u64,
    /// Receipt status; `false` means the transaction reverted.
    pub success: bool,
}

/// Per-network RPC facade used by the swap engine.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Network this ledger talks to.
    fn network(&self) -> &NetworkConfig;

    /// Address of the custodial signer.
    fn signer_address(&self) -> Address;

    /// Next nonce the network would accept from `address` (pending count).
    async fn next_nonce(&self, address: Address) -> Result<u64, LedgerError>;

    async fn native_balance(&self, address: Address) -> Result<U256, LedgerError>;

    /// Token balance of `holder` for the contract `asset`.
    async fn asset_balance(&self, asset: Address, holder: Address) -> Result<U256, LedgerError>;

    /// Decimal precision of a token contract, 18 if the lookup fails.
    async fn asset_decimals(&self, asset: Address) -> u8;

    async fn send_native(
        &self,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError>;

    async fn send_asset(
        &self,
        asset: Address,
        to: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, SubmissionError>;

    /// Wait until `tx_hash` has `confirmations` blocks on top of (and
    /// including) its inclusion block.
    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<Confirmation, LedgerError>;

    /// Decimal precision of any asset identifier.
    async fn decimals_of(&self, asset: &AssetId) -> u8 {
        match asset {
            AssetId::Native => NATIVE_DECIMALS,
            AssetId::Contract(addr) if self.network().is_wrapped_native(addr) => NATIVE_DECIMALS,
            AssetId::Contract(addr) => self.asset_decimals(*addr).await,
        }
    }
}
