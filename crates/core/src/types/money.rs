//! Fixed-point money helpers.
//!
//! All amounts are `rust_decimal::Decimal` in the shop's single currency and
//! are persisted as `NUMERIC(10, 2)`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept on every stored or displayed amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to cents, halves away from zero.
///
/// The result always carries exactly two decimal places, so `5` becomes
/// `5.00` and serializes as `"5.00"`.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
