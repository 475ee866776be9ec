// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Swap Engine - Custodial Swap Execution Service
//!
//! Settles two-party token swaps from one custodial signing key on EVM
//! networks (Avalanche Fuji and C-Chain by default).
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Static bearer-token authentication
//! - `blockchain` - EVM ledger integration
//! - `swap` - Swap planning, execution, state and the request queue

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod swap;
