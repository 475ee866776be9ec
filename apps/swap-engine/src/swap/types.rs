// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap domain types: validated requests, planned transfers and step outcomes.

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::AssetId;

use super::fee::{FeeBreakdown, FeeRate};

/// Why a step finished without moving funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The amount to move rounds to zero minor units.
    ZeroAmount,
    /// The recipient is the signing account itself.
    SelfTransfer,
}

/// Why a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The signer's native balance is below the gas reserve.
    OutOfGas,
    /// The ledger rejected the submission for a non-retryable reason.
    Fatal,
    /// Mined, but the receipt reports failure.
    Reverted,
}

/// Outcome of one transfer step.
///
/// `Submitted` and `Skipped` are terminal; a step in any other state is
/// attempted again when the swap is resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TransferStatus {
    Pending,
    WaitingForFunds,
    Skipped {
        reason: SkipReason,
    },
    Submitted {
        #[serde(rename = "txHash")]
        #[schema(value_type = String)]
        tx_hash: TxHash,
    },
    Failed {
        kind: FailureKind,
    },
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Submitted { .. } | TransferStatus::Skipped { .. }
        )
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            TransferStatus::Submitted { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            TransferStatus::Failed { kind } => Some(*kind),
            _ => None,
        }
    }
}

/// Which step of a swap a transfer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferLabel {
    /// Seller's asset, net of fee, to the buyer.
    BuyerPayout,
    /// Buyer's asset, net of fee, to the seller.
    SellerPayout,
    /// Treasury share of the fee taken from the buyer payout.
    BuyerSideFee,
    /// Treasury share of the fee taken from the seller payout.
    SellerSideFee,
}

impl std::fmt::Display for TransferLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransferLabel::BuyerPayout => "buyer_payout",
            TransferLabel::SellerPayout => "seller_payout",
            TransferLabel::BuyerSideFee => "buyer_side_fee",
            TransferLabel::SellerSideFee => "seller_side_fee",
        };
        f.write_str(label)
    }
}

/// One asset movement, fully resolved to minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub label: TransferLabel,
    pub asset: AssetId,
    pub recipient: Address,
    pub amount: U256,
}

/// A validated swap request.
///
/// Amounts stay as the caller's decimal strings until the plan is built,
/// because their precision depends on the network's token metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub idempotency_key: String,
    pub network: String,
    pub buyer_address: Address,
    pub seller_address: Address,
    pub buyer_amount: String,
    pub buyer_token: AssetId,
    pub seller_amount: String,
    pub seller_token: AssetId,
    pub fee_rate: FeeRate,
}

/// Every transfer a swap will make, computed once from the gross amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub buyer_payout: PlannedTransfer,
    pub seller_payout: PlannedTransfer,
    pub buyer_side_fee: PlannedTransfer,
    pub seller_side_fee: PlannedTransfer,
    pub fees: FeeBreakdown,
}

impl SwapPlan {
    /// Lay out the four transfers for `request`.
    ///
    /// `buyer_gross` is the seller's asset (paid to the buyer) and
    /// `seller_gross` the buyer's asset (paid to the seller), both in minor
    /// units.
    pub fn new(
        request: &SwapRequest,
        buyer_gross: U256,
        seller_gross: U256,
        treasury: Address,
    ) -> Self {
        let fees = super::fee::compute(buyer_gross, seller_gross, request.fee_rate);

        Self {
            buyer_payout: PlannedTransfer {
                label: TransferLabel::BuyerPayout,
                asset: request.seller_token,
                recipient: request.buyer_address,
                amount: fees.buyer_net,
            },
            seller_payout: PlannedTransfer {
                label: TransferLabel::SellerPayout,
                asset: request.buyer_token,
                recipient: request.seller_address,
                amount: fees.seller_net,
            },
            buyer_side_fee: PlannedTransfer {
                label: TransferLabel::BuyerSideFee,
                asset: request.seller_token,
                recipient: treasury,
                amount: fees.buyer_side_treasury,
            },
            seller_side_fee: PlannedTransfer {
                label: TransferLabel::SellerSideFee,
                asset: request.buyer_token,
                recipient: treasury,
                amount: fees.seller_side_treasury,
            },
            fees,
        }
    }
}

/// The fee step: two legs, one per asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeTransfer {
    pub buyer_side: TransferStatus,
    pub seller_side: TransferStatus,
}

impl FeeTransfer {
    pub fn pending() -> Self {
        Self {
            buyer_side: TransferStatus::Pending,
            seller_side: TransferStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.buyer_side.is_terminal() && self.seller_side.is_terminal()
    }
}

/// Coarse lifecycle of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SwapPhase {
    Pending,
    WaitingForFunds,
    PartiallyFailed,
    Completed,
}
