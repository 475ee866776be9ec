// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated requests.
//!
//! Add `Auth` to a handler's arguments to require the bearer token:
//!
//! ```rust,ignore
//! async fn my_handler(_auth: Auth, State(state): State<AppState>) -> impl IntoResponse {
//!     // only reached with a valid token
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::AuthError;
use crate::state::AppState;

/// Proof that the request carried the configured bearer token.
#[derive(Debug)]
pub struct Auth;

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        if state.api_token.verify(token) {
            Ok(Auth)
        } else {
            tracing::debug!(path = %parts.uri.path(), "Rejected request with invalid API token");
            Err(AuthError::InvalidToken)
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/execute-swap");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Ok("abc"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(bearer_token(&parts(None)), Err(AuthError::MissingAuthHeader));
        assert_eq!(
            bearer_token(&parts(Some("Basic abc"))),
            Err(AuthError::InvalidAuthHeader)
        );
        assert_eq!(
            bearer_token(&parts(Some("Bearer "))),
            Err(AuthError::InvalidAuthHeader)
        );
    }
}
