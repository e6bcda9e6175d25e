//! Numeric handling for invoice amounts.
//!
//! Amounts are plain `f64` in display currency units (rupees). Form inputs can
//! hold values that are not numbers at all, so `NaN` is a legitimate state of
//! a draft line; these helpers make the treatment of `NaN` explicit.

/// Flat tax rate applied to every invoice subtotal.
pub const TAX_RATE: f64 = 0.12;

/// Coerce form input text to a number.
///
/// Blank input is `0`; anything that does not parse as a finite number is
/// `NaN` (kept as-is so validation can reject it later). Spellings such as
/// `inf` or `NaN` and overflowing literals like `1e400` count as non-numeric.
pub fn coerce_number(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

/// `NaN` counts as zero for display arithmetic.
pub fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

/// Round to the nearest integer, ties toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Round to two decimals, ties toward positive infinity.
pub fn round_to_cents(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

/// Tax owed on `subtotal`, rounded to a whole unit.
pub fn compute_tax(subtotal: f64) -> f64 {
    round_half_up(subtotal * TAX_RATE)
}

/// Invoice total. No rounding of its own: it is exactly `subtotal + tax`.
pub fn compute_total(subtotal: f64, tax: f64) -> f64 {
    subtotal + tax
}

/// Format an amount with Indian digit grouping and two decimals
/// (`1,23,456.50`). Non-finite values render as zero.
pub fn format_amount(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{frac_part}", group_indian(int_part))
}

/// [`format_amount`] prefixed with the rupee sign.
pub fn format_inr(amount: f64) -> String {
    format!("₹{}", format_amount(amount))
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    groups.push(head);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn coerce_follows_form_input_rules() {
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert_eq!(coerce_number(" 12 "), 12.0);
        assert_eq!(coerce_number("99.5"), 99.5);
        assert_eq!(coerce_number("-3"), -3.0);
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("1,000").is_nan());
    }

    #[test]
    fn coerce_rejects_non_finite_spellings() {
        for raw in ["inf", "-inf", "Infinity", "infinity", "NaN", "nan", "1e400", "-1e400"] {
            assert!(coerce_number(raw).is_nan(), "{raw} should be NaN");
        }
        assert_eq!(coerce_number("1e3"), 1000.0);
    }

    #[test]
    fn tax_rounds_half_up() {
        assert_eq!(compute_tax(298.5), 36.0);
        assert_eq!(compute_tax(250.0), 30.0);
        assert_eq!(compute_tax(4.0), 0.0);
        assert_eq!(compute_tax(0.0), 0.0);
    }

    #[test]
    fn total_is_plain_sum() {
        assert_eq!(compute_total(298.5, 36.0), 334.5);
    }

    #[test]
    fn formats_with_indian_grouping() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(123456.5), "1,23,456.50");
        assert_eq!(format_amount(12345678.0), "1,23,45,678.00");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
        assert_eq!(format_amount(f64::NAN), "0.00");
        assert_eq!(format_inr(250.0), "₹250.00");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: total never drifts from subtotal + tax.
        #[test]
        fn total_equals_subtotal_plus_tax(subtotal in 0.0f64..10_000_000.0) {
            let tax = compute_tax(subtotal);
            prop_assert_eq!(tax, (subtotal * TAX_RATE + 0.5).floor());
            prop_assert_eq!(compute_total(subtotal, tax), subtotal + tax);
        }

        /// Property: grouping never changes the digits.
        #[test]
        fn grouping_preserves_digits(value in 0u64..1_000_000_000_000u64) {
            let formatted = format_amount(value as f64);
            let digits: String = formatted.chars().filter(|c| c.is_ascii_digit()).collect();
            prop_assert_eq!(digits, format!("{value}00"));
        }
    }
}
