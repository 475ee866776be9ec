// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between human-readable decimal amounts and minor units.
//!
//! Everything past the ledger boundary works in integer minor units. Decimal
//! strings are converted here, once, by truncation: digits beyond the asset's
//! precision are dropped, never rounded up. Scientific notation is refused.

use alloy::primitives::U256;

/// Errors that can occur while parsing an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Scientific notation is not accepted: {0}")]
    ScientificNotation(String),

    #[error("Signed amounts are not accepted: {0}")]
    Signed(String),

    #[error("Invalid amount format: {0}")]
    Malformed(String),

    #[error("Amount overflow: {0}")]
    Overflow(String),
}

/// Parse a human-readable amount to minor units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for native coins, 6 for USDC)
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit, fractional digits past `decimals`
///   truncated
/// * `Err` - If parsing fails
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }
    if trimmed.contains(['e', 'E']) {
        return Err(AmountError::ScientificNotation(trimmed.to_string()));
    }
    if trimmed.starts_with(['-', '+']) {
        return Err(AmountError::Signed(trimmed.to_string()));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountError::Malformed(trimmed.to_string()));
    }

    // Truncate, then right-pad the fraction to exactly `decimals` digits.
    let precision = decimals as usize;
    let kept = &fraction[..fraction.len().min(precision)];
    let digits = format!("{whole}{kept:0<precision$}");

    if digits.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(&digits, 10).map_err(|_| AmountError::Overflow(trimmed.to_string()))
}
