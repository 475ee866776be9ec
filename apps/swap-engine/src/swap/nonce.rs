// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local nonce counter for the custodial signer on one network.

use alloy::primitives::Address;

use crate::blockchain::{Ledger, LedgerError};

/// Next nonce to use, lazily loaded from the network.
///
/// Owned per network behind an async mutex. The counter advances by exactly
/// one per reservation and is reloaded from the ledger after any failed
/// submission, since the failure may or may not have consumed the nonce.
#[derive(Debug)]
pub struct NonceTracker {
    address: Address,
    next: Option<u64>,
}

impl NonceTracker {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            next: None,
        }
    }

    /// The nonce the next reservation will hand out, if known.
    #[cfg(test)]
    pub fn peek(&self) -> Option<u64> {
        self.next
    }

    /// Obtain a nonce and advance the counter.
    pub async fn reserve(&mut self, ledger: &dyn Ledger) -> Result<u64, LedgerError> {
        let nonce = match self.next {
            Some(nonce) => nonce,
            None => ledger.next_nonce(self.address).await?,
        };
        self.next = Some(nonce + 1);
        Ok(nonce)
    }

    /// Reload from the network's pending transaction count.
    ///
    /// On failure the counter is cleared, so the next reservation queries
    /// the network instead of trusting a stale value.
    pub async fn resync(&mut self, ledger: &dyn Ledger) -> Result<u64, LedgerError> {
        match ledger.next_nonce(self.address).await {
            Ok(nonce) => {
                tracing::debug!(address = %self.address, nonce, "Nonce resynced");
                self.next = Some(nonce);
                Ok(nonce)
            }
            Err(e) => {
                self.next = None;
                Err(e)
            }
        }
    }
}
