// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Static bearer-token authentication for the swap API.
//!
//! ## Auth Flow
//!
//! 1. The operator configures `SWAP_API_TOKEN`; only its SHA-256 digest is kept
//! 2. Clients send `Authorization: Bearer <token>`
//! 3. The `Auth` extractor hashes the presented token and compares digests in
//!    constant time
//!
//! `/health` and the API docs are unauthenticated; everything else requires
//! the token and answers 401 otherwise.

pub mod error;
pub mod extractor;
pub mod token;

pub use error::AuthError;
pub use extractor::Auth;
pub use token::ApiToken;
