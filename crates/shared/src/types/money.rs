//! Money rounding policy.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts and balances are `rust_decimal::Decimal` everywhere.
//!
//! Inputs are normalised once, at the boundary, to [`MONEY_SCALE`] fractional
//! digits using banker's rounding (round half to even). After normalisation
//! every sum and difference is exact, so balances never drift.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for amounts and balances (cents).
pub const MONEY_SCALE: u32 = 2;

/// Largest amount or opening balance accepted from callers (one trillion).
///
/// Keeps every normalised value well inside `Decimal`'s range, so cents are
/// always representable and sums of stored amounts leave headroom.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_232, 23_283, 0, false, MONEY_SCALE);

/// Normalises an amount to [`MONEY_SCALE`] digits with banker's rounding.
///
/// The result carries exactly `MONEY_SCALE` digits so that values compare
/// and render consistently (`100` becomes `100.00`). Values near
/// `Decimal::MAX` have no room for cents and keep a smaller scale; callers
/// bound input by [`MAX_AMOUNT`] first.
#[must_use]
pub fn normalize_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(MONEY_SCALE);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}
