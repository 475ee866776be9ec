// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for EVM networks.
//!
//! This module provides functionality for:
//! - Querying native and ERC-20 balances of the custodial signer
//! - Nonce queries, transfer submission and confirmation waits
//! - Converting decimal amounts to minor units
//! - Loading the custodial signing key

pub mod client;
pub mod erc20;
pub mod ledger;
#[cfg(test)]
pub mod mock;
pub mod signing;
pub mod types;
pub mod units;

pub use client::EvmLedger;
pub use ledger::{
    classify_rpc_message, Confirmation, Ledger, LedgerError, SubmissionError,
    SubmissionFailureKind,
};
pub use signing::signer_from_secret;
pub use types::*;
pub use units::{parse_amount, AmountError};
