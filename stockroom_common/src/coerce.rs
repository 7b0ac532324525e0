//! Numeric coercion for user and CSV input.
//!
//! Input arrives as free text (form fields, CSV cells). Parsing is
//! prefix-based: leading whitespace is skipped and the longest numeric
//! prefix is used, so `"12abc"` reads as 12 and `"2.5kg"` as 2.5.
//! Nothing here ever fails; unusable input falls back to a default.

use log::debug;

/// Fallback quantity when the input is empty or not a number.
///
/// New items default to 1, edits and imports to 0. An explicit "0" is a
/// usable quantity and is kept on every path, including new items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityDefault {
    /// The "add new item" form
    NewItem,
    /// Saving an edited item
    Edit,
    /// A row of an imported CSV
    Import,
}

impl QuantityDefault {
    pub fn value(self) -> u64 {
        match self {
            QuantityDefault::NewItem => 1,
            QuantityDefault::Edit | QuantityDefault::Import => 0,
        }
    }
}

/// Parses a quantity from free text.
///
/// # Arguments
/// * `text` - Raw input such as `"4"`, `" 12 pcs"` or `"3.9"`
/// * `default` - Which fallback applies when no usable integer is found
///
/// # Returns
/// The leading integer, truncated toward zero. Empty, non-numeric and
/// negative input yield `default.value()`.
pub fn parse_quantity(text: &str, default: QuantityDefault) -> u64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digit_len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if digit_len == 0 {
        debug!("No quantity in '{text}', defaulting to {}", default.value());
        return default.value();
    }

    let value = digits[..digit_len].bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });

    if negative && value > 0 {
        debug!("Negative quantity '{text}', defaulting to {}", default.value());
        return default.value();
    }
    value
}

/// Parses a price from free text.
///
/// # Arguments
/// * `text` - Raw input such as `"2.50"`, `".5"` or `"1e3"`
///
/// # Returns
/// The leading decimal number. Empty, non-numeric, negative and
/// non-finite input yield 0.
pub fn parse_price(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let Some(prefix) = decimal_prefix(trimmed) else {
        debug!("No price in '{text}', defaulting to 0");
        return 0.0;
    };

    match prefix.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => {
            debug!("Unusable price '{text}', defaulting to 0");
            0.0
        }
    }
}

/// Longest prefix of `s` shaped like `[+-]digits[.digits][e[+-]digits]`.
fn decimal_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        start
            + bytes[start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        let frac_count = frac_end - end - 1;
        if frac_count > 0 {
            digit_count += frac_count;
            end = frac_end;
        }
    }

    if digit_count == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    Some(&s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_quantity_tests {
        use super::*;

        #[test]
        fn parses_plain_integer() {
            assert_eq!(parse_quantity("42", QuantityDefault::Edit), 42);
        }

        #[test]
        fn uses_leading_digits_only() {
            assert_eq!(parse_quantity("12abc", QuantityDefault::Edit), 12);
            assert_eq!(parse_quantity("  7 pcs", QuantityDefault::Edit), 7);
        }

        #[test]
        fn truncates_decimals() {
            assert_eq!(parse_quantity("3.9", QuantityDefault::Edit), 3);
        }

        #[test]
        fn accepts_explicit_plus_sign() {
            assert_eq!(parse_quantity("+4", QuantityDefault::Edit), 4);
        }

        #[test]
        fn zero_is_a_valid_quantity() {
            assert_eq!(parse_quantity("0", QuantityDefault::NewItem), 0);
        }

        #[test]
        fn invalid_input_uses_new_item_default() {
            assert_eq!(parse_quantity("abc", QuantityDefault::NewItem), 1);
            assert_eq!(parse_quantity("", QuantityDefault::NewItem), 1);
        }

        #[test]
        fn invalid_input_uses_edit_and_import_default() {
            assert_eq!(parse_quantity("abc", QuantityDefault::Edit), 0);
            assert_eq!(parse_quantity("", QuantityDefault::Import), 0);
        }

        #[test]
        fn negative_falls_back_to_default() {
            assert_eq!(parse_quantity("-3", QuantityDefault::NewItem), 1);
            assert_eq!(parse_quantity("-3", QuantityDefault::Edit), 0);
        }

        #[test]
        fn saturates_on_overflow() {
            assert_eq!(
                parse_quantity("99999999999999999999999", QuantityDefault::Edit),
                u64::MAX
            );
        }
    }

    mod parse_price_tests {
        use super::*;

        #[test]
        fn parses_decimal() {
            assert!((parse_price("2.50") - 2.5).abs() < 1e-9);
        }

        #[test]
        fn parses_integer() {
            assert!((parse_price("100") - 100.0).abs() < 1e-9);
        }

        #[test]
        fn parses_leading_fraction() {
            assert!((parse_price(".5") - 0.5).abs() < 1e-9);
        }

        #[test]
        fn ignores_trailing_garbage() {
            assert!((parse_price("2.5kg") - 2.5).abs() < 1e-9);
            assert!((parse_price("3.") - 3.0).abs() < 1e-9);
        }

        #[test]
        fn parses_exponent() {
            assert!((parse_price("1e3") - 1000.0).abs() < 1e-9);
            assert!((parse_price("2E-1") - 0.2).abs() < 1e-9);
        }

        #[test]
        fn incomplete_exponent_is_ignored() {
            assert!((parse_price("4e") - 4.0).abs() < 1e-9);
        }

        #[test]
        fn invalid_input_is_zero() {
            assert_eq!(parse_price("abc"), 0.0);
            assert_eq!(parse_price(""), 0.0);
            assert_eq!(parse_price("."), 0.0);
        }

        #[test]
        fn negative_is_zero() {
            assert_eq!(parse_price("-2"), 0.0);
        }

        #[test]
        fn overflow_is_zero() {
            assert_eq!(parse_price("1e400"), 0.0);
        }
    }
}
