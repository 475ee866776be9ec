// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee policy.
//!
//! The total fee rate is split evenly between the two parties. Of each
//! collected fee, 70% is forwarded to the treasury; the remaining 30% stays
//! with the signer and is never transferred. Everything is integer arithmetic
//! in minor units, so recomputation on a retry is bit-identical.

use alloy::primitives::U256;

use crate::blockchain::parse_amount;

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fee rate applied when the request carries none (10%).
pub const DEFAULT_FEE_BPS: u32 = 1_000;

/// Treasury's share of each collected fee (70%).
pub const TREASURY_SHARE_BPS: u64 = 7_000;

/// Total fee rate in basis points, `0..=10_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate(u32);

impl FeeRate {
    pub fn from_bps(bps: u32) -> Option<Self> {
        (u64::from(bps) <= BPS_DENOMINATOR).then_some(Self(bps))
    }

    /// Interpret a percentage (`"10"`, `"2.5"`) from the wire.
    ///
    /// Absent, unparseable or out-of-range input yields the default rate.
    /// Digits past two decimals are truncated.
    pub fn from_percent(raw: Option<&str>) -> Self {
        raw.and_then(|raw| parse_amount(raw, 2).ok())
            .and_then(|bps| u32::try_from(bps).ok())
            .and_then(Self::from_bps)
            .unwrap_or_default()
    }

    pub fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self(DEFAULT_FEE_BPS)
    }
}

/// Every amount the fee policy derives for one swap, in minor units.
///
/// "Buyer side" is the asset paid out to the buyer; "seller side" is the
/// asset paid out to the seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub rate_bps: u32,
    pub buyer_gross: U256,
    pub buyer_fee: U256,
    pub buyer_net: U256,
    pub seller_gross: U256,
    pub seller_fee: U256,
    pub seller_net: U256,
    pub buyer_side_treasury: U256,
    pub seller_side_treasury: U256,
}

/// Compute net amounts and treasury shares.
///
/// * `buyer_gross` - gross amount of the asset flowing to the buyer
/// * `seller_gross` - gross amount of the asset flowing to the seller
pub fn compute(buyer_gross: U256, seller_gross: U256, rate: FeeRate) -> FeeBreakdown {
    // Per-party rate is F/2, so fee = floor(gross * F / 20_000).
    let per_party_denominator = BPS_DENOMINATOR * 2;
    let buyer_fee = mul_div_floor(buyer_gross, rate.bps() as u64, per_party_denominator);
    let seller_fee = mul_div_floor(seller_gross, rate.bps() as u64, per_party_denominator);

    FeeBreakdown {
        rate_bps: rate.bps(),
        buyer_gross,
        buyer_fee,
        buyer_net: buyer_gross - buyer_fee,
        seller_gross,
        seller_fee,
        seller_net: seller_gross - seller_fee,
        buyer_side_treasury: treasury_share_of(buyer_fee),
        seller_side_treasury: treasury_share_of(seller_fee),
    }
}

/// The part of a collected fee forwarded to the treasury.
pub fn treasury_share_of(fee: U256) -> U256 {
    mul_div_floor(fee, TREASURY_SHARE_BPS, BPS_DENOMINATOR)
}

/// `floor(value * numerator / denominator)` for `numerator <= denominator`.
///
/// Split as `q*n + floor(r*n/d)` with `value = q*d + r`, which is exact and
/// cannot overflow.
fn mul_div_floor(value: U256, numerator: u64, denominator: u64) -> U256 {
    debug_assert!(numerator <= denominator);
    let n = U256::from(numerator);
    let d = U256::from(denominator);
    let q = value / d;
    let r = value % d;
    q * n + r * n / d
}
