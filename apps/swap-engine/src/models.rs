// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures of the swap API. Every field of the
//! execute-swap body is optional at the JSON level so that malformed input is
//! answered in-body with `INVALID_REQUEST` rather than a transport error.
//!
//! ## Model Categories
//!
//! - **Swap request**: the wire body and its validation into a [`SwapRequest`]
//! - **Swap response**: outcome, transaction hashes, per-step status
//! - **Operator**: cache clearing

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::AssetId;
use crate::swap::fee::FeeRate;
use crate::swap::state::SwapState;
use crate::swap::types::{SwapPhase, SwapRequest, TransferStatus};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 256;

// =============================================================================
// Swap Request
// =============================================================================

/// An amount as clients send it: a decimal string or a JSON number.
///
/// JSON integers are kept exactly. Any other JSON number has already been
/// rounded to `f64` by the parser, so it is kept apart and refused where
/// exact minor units matter.
#[derive(Debug, Clone, PartialEq)]
pub enum WireAmount {
    Text(String),
    Integer(String),
    Float(f64),
}

impl WireAmount {
    /// Exact decimal text of a transfer amount.
    pub fn exact_text(self, field: &str) -> Result<String, String> {
        match self {
            WireAmount::Text(text) | WireAmount::Integer(text) => Ok(text),
            WireAmount::Float(_) => Err(format!(
                "{field} must be a decimal string or a JSON integer within 64 bits"
            )),
        }
    }

    /// Decimal text, accepting the float spelling. Only for the fee rate,
    /// which is truncated to two decimals anyway.
    pub fn lossy_text(self) -> String {
        match self {
            WireAmount::Text(text) | WireAmount::Integer(text) => text,
            WireAmount::Float(value) => value.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for WireAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct WireAmountVisitor;

        impl serde::de::Visitor<'_> for WireAmountVisitor {
            type Value = WireAmount;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a decimal string or a JSON number")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(WireAmount::Text(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(WireAmount::Text(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(WireAmount::Integer(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(WireAmount::Integer(v.to_string()))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(WireAmount::Float(v))
            }
        }

        deserializer.deserialize_any(WireAmountVisitor)
    }
}

/// Body of `POST /execute-swap`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSwapRequest {
    /// Receives the seller's asset.
    #[schema(example = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")]
    pub buyer_address: Option<String>,
    /// Receives the buyer's asset.
    pub seller_address: Option<String>,
    /// Gross amount of the buyer's asset, paid to the seller.
    #[schema(value_type = Option<String>, example = "100")]
    pub buyer_amount: Option<WireAmount>,
    /// `native`, the zero address, or a token contract address.
    pub buyer_token: Option<String>,
    /// Gross amount of the seller's asset, paid to the buyer.
    #[schema(value_type = Option<String>, example = "200")]
    pub seller_amount: Option<WireAmount>,
    pub seller_token: Option<String>,
    #[schema(example = "fuji")]
    pub network: Option<String>,
    /// Total fee in percent, split evenly between the parties. Defaults to 10.
    #[schema(value_type = Option<String>, example = "10")]
    pub fee_percent: Option<WireAmount>,
    pub idempotency_key: Option<String>,
}

impl ExecuteSwapRequest {
    /// Check presence and syntax of every field.
    ///
    /// Amounts are left as text; their precision depends on the asset and
    /// is only known once the network is resolved.
    pub fn validate(self) -> Result<SwapRequest, String> {
        let idempotency_key = required("idempotencyKey", self.idempotency_key)?;
        if idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(format!(
                "idempotencyKey longer than {MAX_IDEMPOTENCY_KEY_LEN} characters"
            ));
        }

        let network = required("network", self.network)?.to_ascii_lowercase();
        let buyer_address = parse_address("buyerAddress", self.buyer_address)?;
        let seller_address = parse_address("sellerAddress", self.seller_address)?;
        let buyer_token = parse_asset("buyerToken", self.buyer_token)?;
        let seller_token = parse_asset("sellerToken", self.seller_token)?;
        let buyer_amount = required_amount("buyerAmount", self.buyer_amount)?;
        let seller_amount = required_amount("sellerAmount", self.seller_amount)?;

        let fee_percent = self.fee_percent.map(WireAmount::lossy_text);
        let fee_rate = FeeRate::from_percent(fee_percent.as_deref());

        Ok(SwapRequest {
            idempotency_key,
            network,
            buyer_address,
            seller_address,
            buyer_amount,
            buyer_token,
            seller_amount,
            seller_token,
            fee_rate,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{field} is required"))
}

fn required_amount(field: &str, value: Option<WireAmount>) -> Result<String, String> {
    let text = value.map(|v| v.exact_text(field)).transpose()?;
    required(field, text)
}

fn parse_address(field: &str, value: Option<String>) -> Result<Address, String> {
    let raw = required(field, value)?;
    Address::from_str(&raw).map_err(|e| format!("{field} is not a valid address: {e}"))
}

fn parse_asset(field: &str, value: Option<String>) -> Result<AssetId, String> {
    let raw = required(field, value)?;
    AssetId::from_str(&raw).map_err(|e| format!("{field}: {e}"))
}

// =============================================================================
// Swap Response
// =============================================================================

/// Machine-readable outcome code. Absent on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapCode {
    /// The signer lacks the asset to send; resubmit once funds arrive.
    WaitingForFunds,
    /// The signer's native balance is below the gas reserve. Operator alert.
    OutOfGas,
    /// A transfer was rejected or reverted.
    TransferFailed,
    /// A transient ledger problem; resubmit later.
    RetryLater,
    UnsupportedNetwork,
    InvalidRequest,
    /// The idempotency key was already used with a different payload.
    IdempotencyConflict,
    /// Another task is driving this key.
    InProgress,
    /// The swap task exceeded its time ceiling. It may still finish.
    QueueTimeout,
    InternalError,
}

/// Transaction hashes per step, `null` when a step has none.
///
/// The fee step pays the treasury in both assets, so it has two legs:
/// `transfer3` and `transfer4`. Either leg is `null` when it was skipped,
/// for instance because its treasury share rounds to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SwapTransactions {
    /// Seller's asset to the buyer.
    pub transfer1: Option<String>,
    /// Buyer's asset to the seller.
    pub transfer2: Option<String>,
    /// Fee leg one: treasury share of the buyer-side fee, in the seller's asset.
    pub transfer3: Option<String>,
    /// Fee leg two: treasury share of the seller-side fee, in the buyer's asset.
    pub transfer4: Option<String>,
}

/// Fee step status, one entry per asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeSteps {
    pub buyer_side: TransferStatus,
    pub seller_side: TransferStatus,
}

/// Status of every step of a tracked swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapSteps {
    pub phase: SwapPhase,
    pub buyer_transfer: TransferStatus,
    pub seller_transfer: TransferStatus,
    pub fee_transfer: FeeSteps,
}

/// Response of `POST /execute-swap`. Always HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub success: bool,
    pub message: String,
    pub transactions: SwapTransactions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<SwapCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<SwapSteps>,
}

impl SwapResponse {
    /// A failure with no tracked state behind it.
    pub fn rejected(code: SwapCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transactions: SwapTransactions::default(),
            code: Some(code),
            steps: None,
        }
    }

    /// Snapshot of a tracked swap. Successful when `code` is `None`.
    pub fn from_state(state: &SwapState, code: Option<SwapCode>, message: impl Into<String>) -> Self {
        let hash = |status: &TransferStatus| status.tx_hash().map(|h| h.to_string());

        Self {
            success: code.is_none(),
            message: message.into(),
            transactions: SwapTransactions {
                transfer1: hash(&state.buyer_transfer),
                transfer2: hash(&state.seller_transfer),
                transfer3: hash(&state.fee_transfer.buyer_side),
                transfer4: hash(&state.fee_transfer.seller_side),
            },
            code,
            steps: Some(SwapSteps {
                phase: state.phase(),
                buyer_transfer: state.buyer_transfer.clone(),
                seller_transfer: state.seller_transfer.clone(),
                fee_transfer: FeeSteps {
                    buyer_side: state.fee_transfer.buyer_side.clone(),
                    seller_side: state.fee_transfer.seller_side.clone(),
                },
            }),
        }
    }
}

// =============================================================================
// Operator Models
// =============================================================================

/// Response of `DELETE /cache/{idempotency_key}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearedResponse {
    pub idempotency_key: String,
    pub cleared: bool,
}
