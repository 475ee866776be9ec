// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::ApiToken;
use crate::swap::{RequestSerializer, SwapEngine, SwapStateStore};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SwapEngine>,
    pub serializer: RequestSerializer,
    pub api_token: ApiToken,
}

impl AppState {
    pub fn new(engine: Arc<SwapEngine>, serializer: RequestSerializer, api_token: ApiToken) -> Self {
        Self {
            engine,
            serializer,
            api_token,
        }
    }

    pub fn store(&self) -> &Arc<SwapStateStore> {
        self.engine.store()
    }
}
