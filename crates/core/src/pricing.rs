//! Sale pricing.
//!
//! Products store their undiscounted `base_price`. Whether a product is on
//! sale is a flag, and the price a customer sees (and is charged) is derived
//! from the two with [`display_price`]. Toggling the flag never touches the
//! stored amount, so flipping it back and forth always lands on the same
//! price.

use rust_decimal::Decimal;

use crate::types::round_money;

/// Fraction taken off the base price while a product is on sale.
pub const SALE_DISCOUNT: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

/// Price shown to customers for a product with `base_price`.
///
/// On sale: `base_price × (1 − 0.20)`, rounded half-up to cents. Otherwise
/// the base price rounded to cents.
#[must_use]
pub fn display_price(base_price: Decimal, on_sale: bool) -> Decimal {
    if on_sale {
        round_money(base_price - base_price * SALE_DISCOUNT)
    } else {
        round_money(base_price)
    }
}

/// The stored-price toggle the shop used before `base_price` existed.
///
/// Kept as a pure function so its behaviour stays documented and pinned by
/// tests. Nothing in the request path calls it.
pub mod legacy {
    use rust_decimal::{Decimal, RoundingStrategy};

    use super::{SALE_DISCOUNT, display_price};

    /// Recompute the stored price when the sale flag changes.
    ///
    /// The old read path discounted the stored price of on-sale products
    /// before the toggle ran, so the toggle started from a possibly
    /// discounted value. Enabling divided by `1 − 0.20` to recover a base and
    /// reapplied the discount; disabling kept the value as-is. The stored
    /// price therefore loses 20% on every on → off transition.
    #[must_use]
    pub fn toggle_stored_price(stored: Decimal, currently_on_sale: bool, on_sale: bool) -> Decimal {
        let current = display_price(stored, currently_on_sale);
        if on_sale {
            let recovered = (current / (Decimal::ONE - SALE_DISCOUNT))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            display_price(recovered, true)
        } else {
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap_or_default()
    }

    #[test]
    fn test_display_price_off_sale_is_base() {
        assert_eq!(display_price(dec("19.99"), false), dec("19.99"));
        assert_eq!(display_price(dec("5"), false).to_string(), "5.00");
    }

    #[test]
    fn test_display_price_on_sale_discounts_twenty_percent() {
        assert_eq!(display_price(dec("100.00"), true), dec("80.00"));
        assert_eq!(display_price(dec("30.00"), true), dec("24.00"));
    }

    #[test]
    fn test_display_price_rounds_half_up() {
        // 0.05 * 0.8 = 0.040, 0.13 * 0.8 = 0.104
        assert_eq!(display_price(dec("0.05"), true), dec("0.04"));
        assert_eq!(display_price(dec("0.13"), true), dec("0.10"));
        // 1.99 * 0.8 = 1.592
        assert_eq!(display_price(dec("1.99"), true), dec("1.59"));
        // 0.31 * 0.8 = 0.248
        assert_eq!(display_price(dec("0.31"), true), dec("0.25"));
    }

    #[test]
    fn test_toggling_flag_is_a_pure_projection() {
        let base = dec("12.34");
        let on = display_price(base, true);
        let off = display_price(base, false);
        assert_eq!(display_price(base, true), on);
        assert_eq!(off, base);
    }

    #[test]
    fn test_legacy_enable_keeps_stored_value() {
        let stored = legacy::toggle_stored_price(dec("100.00"), false, true);
        assert_eq!(stored, dec("100.00"));
    }

    #[test]
    fn test_legacy_round_trip_drifts() {
        // true -> false -> true with no price edits in between.
        let start = dec("100.00");
        let after_off = legacy::toggle_stored_price(start, true, false);
        let after_on = legacy::toggle_stored_price(after_off, false, true);

        assert_eq!(after_off, dec("80.00"));
        assert_eq!(after_on, dec("80.00"));
        assert_ne!(after_on, start);
    }

    #[test]
    fn test_legacy_reenabling_sale_discounts_stored_value() {
        // Enabling an already on-sale product bakes the discount in.
        let stored = legacy::toggle_stored_price(dec("50.00"), true, true);
        assert_eq!(stored, dec("40.00"));
    }
}
