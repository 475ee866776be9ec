// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process swap state store.
//!
//! Maps idempotency keys to per-step transfer status. Bounded twice: an LRU
//! capacity caps memory, and entries older than the retention window are
//! purged regardless of completion. A key can be leased by the task driving
//! it; leased entries are never purged, and callers holding no lease are
//! told the key is in progress.
//!
//! Capacity pressure only ever drops an entry that is past retention or that
//! never broadcast a transaction. A swap with a submitted step keeps its key
//! for the whole retention window; when every slot holds such a swap, new
//! keys are refused with [`StoreError::AtCapacity`].

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tokio::time::Instant;

use crate::models::SwapResponse;

use super::types::{FeeTransfer, SwapPhase, SwapPlan, SwapRequest, TransferStatus};

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("swap state for this key is completed and cannot change")]
    CompletedImmutable,

    #[error("swap state for this key already exists")]
    AlreadyExists,

    #[error("swap state for this key is held by a running task")]
    Leased,

    #[error("swap state store is full of in-flight swaps")]
    AtCapacity,
}

/// Everything recorded about one swap.
#[derive(Debug, Clone)]
pub struct SwapState {
    pub request: SwapRequest,
    pub plan: SwapPlan,
    pub buyer_transfer: TransferStatus,
    pub seller_transfer: TransferStatus,
    pub fee_transfer: FeeTransfer,
    pub completed: bool,
    /// Final response, returned verbatim on replay.
    pub outcome: Option<SwapResponse>,
    pub created_at: DateTime<Utc>,
}

impl SwapState {
    pub fn new(request: SwapRequest, plan: SwapPlan) -> Self {
        Self {
            request,
            plan,
            buyer_transfer: TransferStatus::Pending,
            seller_transfer: TransferStatus::Pending,
            fee_transfer: FeeTransfer::pending(),
            completed: false,
            outcome: None,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &str {
        &self.request.idempotency_key
    }

    /// Whether any step has broadcast a transaction.
    pub fn has_submissions(&self) -> bool {
        [
            &self.buyer_transfer,
            &self.seller_transfer,
            &self.fee_transfer.buyer_side,
            &self.fee_transfer.seller_side,
        ]
        .iter()
        .any(|s| s.tx_hash().is_some())
    }

    pub fn primaries_terminal(&self) -> bool {
        self.buyer_transfer.is_terminal() && self.seller_transfer.is_terminal()
    }

    pub fn phase(&self) -> SwapPhase {
        if self.completed {
            return SwapPhase::Completed;
        }
        let steps = [
            &self.buyer_transfer,
            &self.seller_transfer,
            &self.fee_transfer.buyer_side,
            &self.fee_transfer.seller_side,
        ];
        if steps.iter().any(|s| s.failure().is_some()) {
            SwapPhase::PartiallyFailed
        } else if steps
            .iter()
            .any(|s| matches!(s, TransferStatus::WaitingForFunds))
        {
            SwapPhase::WaitingForFunds
        } else {
            SwapPhase::Pending
        }
    }
}

struct StoredState {
    state: SwapState,
    inserted_at: Instant,
}

struct StoreInner {
    states: LruCache<String, StoredState>,
    leases: HashSet<String>,
}

/// Bounded idempotency-key to swap-state map.
pub struct SwapStateStore {
    inner: Mutex<StoreInner>,
    retention: Duration,
}

impl SwapStateStore {
    /// Create a store holding at most `capacity` swaps for `retention` each.
    pub fn new(capacity: usize, retention: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(StoreInner {
                states: LruCache::new(capacity),
                leases: HashSet::new(),
            }),
            retention,
        }
    }

    fn inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Current state for `key`, if any and not past retention.
    pub fn get(&self, key: &str) -> Option<SwapState> {
        let mut inner = self.inner();
        let leased = inner.leases.contains(key);
        let expired = inner
            .states
            .peek(key)
            .is_some_and(|entry| !leased && entry.inserted_at.elapsed() >= self.retention);
        if expired {
            inner.states.pop(key);
            return None;
        }
        inner.states.get(key).map(|entry| entry.state.clone())
    }

    /// Record a newly created swap.
    pub fn insert_new(&self, state: SwapState) -> Result<(), StoreError> {
        let mut inner = self.inner();
        if inner.states.contains(state.key()) {
            return Err(StoreError::AlreadyExists);
        }
        let now = Instant::now();
        self.make_room(&mut inner, now)?;
        let key = state.key().to_string();
        inner.states.push(key, StoredState { state, inserted_at: now });
        Ok(())
    }

    /// Persist progress on an existing swap.
    ///
    /// A completed state is frozen. If the entry vanished meanwhile it is
    /// written back with retention restarted.
    pub fn save(&self, state: SwapState) -> Result<(), StoreError> {
        let mut inner = self.inner();
        let now = Instant::now();
        let inserted_at = match inner.states.peek(state.key()) {
            Some(existing) if existing.state.completed => {
                return Err(StoreError::CompletedImmutable)
            }
            Some(existing) => existing.inserted_at,
            None => {
                self.make_room(&mut inner, now)?;
                now
            }
        };
        let key = state.key().to_string();
        inner.states.push(key, StoredState { state, inserted_at });
        Ok(())
    }

    /// Free one slot if the store is full, least recently used first.
    fn make_room(&self, inner: &mut StoreInner, now: Instant) -> Result<(), StoreError> {
        if inner.states.len() < inner.states.cap().get() {
            return Ok(());
        }

        let leases = &inner.leases;
        let victim = inner
            .states
            .iter()
            .rev()
            .find(|(key, entry)| {
                !leases.contains(key.as_str())
                    && (now.saturating_duration_since(entry.inserted_at) >= self.retention
                        || !entry.state.has_submissions())
            })
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                if let Some(evicted) = inner.states.pop(&key) {
                    if !evicted.state.completed {
                        tracing::warn!(
                            idempotency_key = %key,
                            phase = ?evicted.state.phase(),
                            "Swap state store at capacity, evicted a swap with nothing broadcast"
                        );
                    }
                }
                Ok(())
            }
            None => {
                tracing::error!(
                    capacity = inner.states.cap().get(),
                    "Swap state store full of in-flight swaps, refusing new key"
                );
                Err(StoreError::AtCapacity)
            }
        }
    }

    /// Forget `key`. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner();
        if inner.leases.contains(key) {
            return Err(StoreError::Leased);
        }
        Ok(inner.states.pop(key).is_some())
    }

    /// Claim exclusive driving rights for `key` until the lease is dropped.
    pub fn try_lease(self: &Arc<Self>, key: &str) -> Option<SwapLease> {
        let mut inner = self.inner();
        if !inner.leases.insert(key.to_string()) {
            return None;
        }
        Some(SwapLease {
            store: Arc::clone(self),
            key: key.to_string(),
        })
    }

    pub fn is_leased(&self, key: &str) -> bool {
        self.inner().leases.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every unleased entry past retention.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// [`purge_expired`](Self::purge_expired) against an explicit clock.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut inner = self.inner();
        let expired: Vec<String> = inner
            .states
            .iter()
            .filter(|(key, entry)| {
                !inner.leases.contains(key.as_str())
                    && now.saturating_duration_since(entry.inserted_at) >= self.retention
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.states.pop(key);
        }
        expired.len()
    }
}

/// Exclusive right to drive one swap. Released on drop.
pub struct SwapLease {
    store: Arc<SwapStateStore>,
    key: String,
}

impl Drop for SwapLease {
    fn drop(&mut self) {
        self.store.inner().leases.remove(&self.key);
    }
}

impl std::fmt::Debug for SwapLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapLease").field("key", &self.key).finish()
    }
}
