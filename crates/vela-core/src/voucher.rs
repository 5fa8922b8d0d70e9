//! # Voucher Evaluator
//!
//! Pure eligibility and discount math for vouchers.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Voucher Evaluation                                 │
//! │                                                                         │
//! │  Voucher + subtotal + now                                               │
//! │        │                                                                │
//! │        ├─► active?            no → Inactive                             │
//! │        ├─► now in window?     no → Expired                              │
//! │        ├─► subtotal ≥ min?    no → BelowMinimum                         │
//! │        ├─► uses remaining?    no → Exhausted                            │
//! │        │                                                                │
//! │        └─► discount = min(subtotal, pct(subtotal) + flat)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module never touches `used_count`: committing a redemption is a
//! persistence concern and happens inside the order creation transaction.

use chrono::{DateTime, Utc};

use crate::error::VoucherError;
use crate::money::Money;
use crate::types::Voucher;

// =============================================================================
// Evaluation
// =============================================================================

/// Checks a voucher's eligibility against an order subtotal and, when
/// eligible, computes the discount it grants.
///
/// ## Checks (in order)
/// 1. `active` flag
/// 2. validity window `[start_date, end_date]` (inclusive bounds)
/// 3. minimum order value
/// 4. usage limit
///
/// ## Discount Formula
/// Percentage and flat components add; the result is capped at the subtotal
/// so the payable total can reach zero but never go negative.
pub fn evaluate(voucher: &Voucher, subtotal: Money, now: DateTime<Utc>) -> Result<Money, VoucherError> {
    if !voucher.active {
        return Err(VoucherError::Inactive);
    }
    if now < voucher.start_date || now > voucher.end_date {
        return Err(VoucherError::Expired);
    }
    if subtotal < voucher.min_order_value() {
        return Err(VoucherError::BelowMinimum);
    }
    if voucher.used_count >= voucher.usage_limit {
        return Err(VoucherError::Exhausted);
    }

    Ok(discount_for(voucher, subtotal))
}

/// Raw discount granted by a voucher on a subtotal, ignoring eligibility.
fn discount_for(voucher: &Voucher, subtotal: Money) -> Money {
    let pct = voucher
        .discount_percent
        .map(|p| subtotal.percentage(p))
        .unwrap_or_else(Money::zero);
    let flat = voucher
        .discount_amount_vnd
        .map(Money::from_vnd)
        .unwrap_or_else(Money::zero);

    (pct + flat).clamp_discount(subtotal)
}

// =============================================================================
// Unit Tests
// =============================================================================
