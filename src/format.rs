//! Number formatting helpers used by property `to_string` implementations.

use crate::catalog::Unit;

/// SI prefixes from yocto (10^-24) to yotta (10^24).
const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "\u{00B5}", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Index of the empty prefix in [`SI_PREFIXES`].
const SI_NONE: usize = 8;

/// Scale `value` to the largest SI prefix that keeps the mantissa at or
/// below 999 and format it with `decimal_places` decimals.
///
/// Returns the formatted mantissa and the prefix symbol. Zero and
/// non-finite values are never scaled.
pub fn format_value_si(value: f64, decimal_places: usize) -> (String, &'static str) {
    let mut prefix = SI_NONE;
    if value != 0.0 && value.is_finite() {
        prefix = 0;
        let mut exp: i32 = 24;
        while value.abs() * 10f64.powi(exp) > 999.0 && prefix < SI_PREFIXES.len() - 1 {
            prefix += 1;
            exp -= 3;
        }
    }

    let exponent = 3 * (prefix as i32 - SI_NONE as i32);
    let scaled = value * 10f64.powi(-exponent);
    (
        format!("{:.*}", decimal_places, scaled),
        SI_PREFIXES[prefix],
    )
}

/// Number of decimal digits in the integer part of `number` (at least 1).
pub fn count_int_digits(number: i64) -> usize {
    let mut n = number.unsigned_abs();
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Decimal places needed to show values at resolution `step`.
pub fn decimal_places(step: f64) -> usize {
    if step <= 0.0 || !step.is_finite() {
        return 0;
    }
    count_int_digits((1.0 / step).ceil() as i64 - 1)
}

/// Total digits needed for values up to `max` at resolution `step`.
pub fn count_double_digits(max: f64, step: f64) -> usize {
    count_int_digits(max.floor() as i64) + decimal_places(step)
}

/// Append `" <unit>"` when the unit is printable.
pub fn with_unit(mut text: String, unit: Unit) -> String {
    if unit.has_suffix() {
        text.push(' ');
        text.push_str(unit.symbol());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn si_prefix_selection() {
        assert_eq!(format_value_si(0.001, 0), ("1".to_string(), "m"));
        assert_eq!(format_value_si(5.0, 1), ("5.0".to_string(), ""));
        assert_eq!(format_value_si(1_000_000.0, 1), ("1.0".to_string(), "M"));
        assert_eq!(format_value_si(0.0, 2), ("0.00".to_string(), ""));
        assert_eq!(format_value_si(f64::INFINITY, 0).1, "");
    }

    #[test]
    fn digit_helpers() {
        assert_eq!(count_int_digits(0), 1);
        assert_eq!(count_int_digits(-12345), 5);
        assert_eq!(decimal_places(0.001), 3);
        assert_eq!(decimal_places(1.0), 1);
        assert_eq!(decimal_places(0.01), 2);
        assert_eq!(count_double_digits(30.0, 0.01), 4);
    }

    #[test]
    fn unit_suffix() {
        assert_eq!(with_unit("1.5".into(), Unit::Volt), "1.5 V");
        assert_eq!(with_unit("3".into(), Unit::Unitless), "3");
    }
}
