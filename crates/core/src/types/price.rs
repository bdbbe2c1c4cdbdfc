//! Display formatting for INR amounts and dates.
//!
//! The store prices everything in whole rupees, so amounts render with the
//! `en-IN` digit grouping (last three digits, then pairs) and no minor
//! units: `1234567` becomes `INR 12,34,567`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Format a rupee amount with the ISO currency code and `en-IN` grouping.
///
/// Fractional paise are rounded away, matching how prices are shown
/// everywhere else in the store.
#[must_use]
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round();
    let grouped = group_indian(&rounded.abs().to_string());
    if rounded.is_sign_negative() {
        format!("-INR {grouped}")
    } else {
        format!("INR {grouped}")
    }
}

/// Format a timestamp as `02 Jan 2026`.
#[must_use]
pub fn format_short_date(at: &DateTime<Utc>) -> String {
    at.format("%d %b %Y").to_string()
}

/// Indian digit grouping: rightmost group of three, then groups of two.
fn group_indian(digits: &str) -> String {
    let mut out = Vec::with_capacity(digits.len() + digits.len() / 2);
    for (i, c) in digits.chars().rev().enumerate() {
        if i == 3 || (i > 3 && (i - 3) % 2 == 0) {
            out.push(',');
        }
        out.push(c);
    }
    out.iter().rev().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_small_amounts_ungrouped() {
        assert_eq!(format_inr(Decimal::ZERO), "INR 0");
        assert_eq!(format_inr(Decimal::from(999)), "INR 999");
    }

    #[test]
    fn test_lakh_grouping() {
        assert_eq!(format_inr(Decimal::from(1_234)), "INR 1,234");
        assert_eq!(format_inr(Decimal::from(12_345)), "INR 12,345");
        assert_eq!(format_inr(Decimal::from(123_456)), "INR 1,23,456");
        assert_eq!(format_inr(Decimal::from(12_345_678)), "INR 1,23,45,678");
    }

    #[test]
    fn test_rounds_fractions() {
        assert_eq!(format_inr(Decimal::new(24995, 1)), "INR 2,500");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_inr(Decimal::from(-1500)), "-INR 1,500");
    }

    #[test]
    fn test_short_date() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 10, 30, 0).unwrap();
        assert_eq!(format_short_date(&at), "02 Jan 2026");
    }
}
