// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Execution Engine
//!
//! Moves funds between two parties with the custodial signer, splitting a fee
//! to the treasury, with the guarantees that make retries safe:
//!
//! - `fee` - integer fee policy
//! - `types` - requests, planned transfers and step outcomes
//! - `state` - bounded idempotency-key store with per-key leases
//! - `nonce` - local nonce counter, resynced after failures
//! - `executor` - one balance-checked, nonce-assigned transfer
//! - `orchestrator` - drives a swap's steps and aggregates the outcome
//! - `queue` - single-flight FIFO serializer for mutating tasks
//! - `janitor` - background purge of expired states

pub mod executor;
pub mod fee;
pub mod janitor;
pub mod nonce;
pub mod orchestrator;
pub mod queue;
pub mod state;
pub mod types;

pub use executor::TransferExecutor;
pub use fee::{FeeBreakdown, FeeRate};
pub use janitor::StateJanitor;
pub use orchestrator::SwapEngine;
pub use queue::{RequestSerializer, TaskFailure};
pub use state::{StoreError, SwapLease, SwapState, SwapStateStore};
pub use types::{
    FailureKind, PlannedTransfer, SkipReason, SwapPhase, SwapPlan, SwapRequest, TransferLabel,
    TransferStatus,
};
