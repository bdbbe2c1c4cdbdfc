//! Delivery pricing.
//!
//! The shipping fee is a closed table of subtotal breakpoints in rupees.
//! The table is a business rule owned by the store; do not "smooth" it.

use rust_decimal::Decimal;

/// Subtotal at and below which the highest non-free tier still applies;
/// the cart page renders progress toward this threshold.
#[must_use]
pub fn free_shipping_threshold() -> Decimal {
    Decimal::from(2500)
}

/// Shipping fee for a given subtotal, in rupees.
#[must_use]
pub fn shipping_fee(subtotal: Decimal) -> Decimal {
    if subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let fee = if subtotal <= Decimal::from(500) {
        50
    } else if subtotal <= Decimal::from(2500) {
        100
    } else if subtotal <= Decimal::from(3500) {
        200
    } else if subtotal <= Decimal::from(5000) {
        300
    } else if subtotal <= Decimal::from(7000) {
        400
    } else {
        500
    };
    Decimal::from(fee)
}

/// Rupees left to reach the reduced-fee threshold; zero once past it.
#[must_use]
pub fn free_shipping_remaining(subtotal: Decimal) -> Decimal {
    (free_shipping_threshold() - subtotal).max(Decimal::ZERO)
}

/// Progress toward the threshold as a percentage, capped at 100.
#[must_use]
pub fn free_shipping_progress(subtotal: Decimal) -> Decimal {
    if subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (subtotal * Decimal::ONE_HUNDRED / free_shipping_threshold()).min(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fee(subtotal: i64) -> Decimal {
        shipping_fee(Decimal::from(subtotal))
    }

    #[test]
    fn test_fee_at_every_breakpoint() {
        // Each tier boundary, tested from both sides.
        let expected = [
            (0, 0),
            (1, 50),
            (500, 50),
            (501, 100),
            (2500, 100),
            (2501, 200),
            (3500, 200),
            (3501, 300),
            (5000, 300),
            (5001, 400),
            (7000, 400),
            (7001, 500),
        ];
        for (subtotal, want) in expected {
            assert_eq!(fee(subtotal), Decimal::from(want), "subtotal {subtotal}");
        }
    }

    #[test]
    fn test_fee_never_decreases() {
        let mut last = Decimal::ZERO;
        for subtotal in 0..=8000 {
            let current = fee(subtotal);
            assert!(current >= last, "fee dropped at subtotal {subtotal}");
            last = current;
        }
    }

    #[test]
    fn test_negative_subtotal_ships_free() {
        assert_eq!(shipping_fee(Decimal::from(-100)), Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_meter() {
        assert_eq!(free_shipping_remaining(Decimal::from(1000)), Decimal::from(1500));
        assert_eq!(free_shipping_remaining(Decimal::from(4000)), Decimal::ZERO);
        assert_eq!(free_shipping_progress(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(free_shipping_progress(Decimal::from(1250)), Decimal::from(50));
        assert_eq!(free_shipping_progress(Decimal::from(9999)), Decimal::from(100));
    }
}
