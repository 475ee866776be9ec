// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static bearer token.
//!
//! Only the SHA-256 digest of the configured token is kept in memory.
//! Presented tokens are hashed and compared in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Digest of the operator-configured API token.
#[derive(Clone)]
pub struct ApiToken {
    digest: [u8; 32],
}

impl ApiToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }

    /// Whether `presented` matches the configured token.
    pub fn verify(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        self.digest[..].ct_eq(&presented[..]).into()
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_configured_token() {
        let token = ApiToken::new("s3cret-token");
        assert!(token.verify("s3cret-token"));
        assert!(!token.verify("s3cret-token "));
        assert!(!token.verify(""));
        assert!(!token.verify("other"));
    }

    #[test]
    fn tokens_differing_in_one_byte_are_rejected() {
        let token = ApiToken::new("abcdefgh");
        assert!(!token.verify("abcdefgi"));
        assert!(!token.verify("Abcdefgh"));
    }

    #[test]
    fn debug_does_not_leak() {
        let token = ApiToken::new("s3cret-token");
        assert_eq!(format!("{token:?}"), "ApiToken(..)");
    }
}
