// 💷 Amount Normalizer
// Free-form currency strings ("R$ 1.200,50", "£1,200.50", "45") → non-negative f64

use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AmountError {
    #[error("no numeric value in amount {0:?}")]
    Unparsable(String),
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize a currency string into a non-negative amount.
///
/// Unparsable input yields `0.0`. Use [`parse_amount`] when the caller needs
/// to know that nothing numeric was found.
///
/// A lone dot is always read as the decimal separator, so `"1.200"` is
/// `1.2`, never `1200`.
pub fn normalize_amount(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

/// Strict variant of [`normalize_amount`].
pub fn parse_amount(raw: &str) -> Result<f64, AmountError> {
    let cleaned = clean_separators(raw);

    match parse_float_prefix(&cleaned) {
        Some(value) if value.is_finite() => Ok(value.abs()),
        _ => Err(AmountError::Unparsable(raw.to_string())),
    }
}

/// Keep only `[0-9.,-]` and rewrite the decimal separator as a dot.
fn clean_separators(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    let last_comma = kept.rfind(',');
    let last_dot = kept.rfind('.');

    match (last_comma, last_dot) {
        // "12,50" → "12.50"
        (Some(_), None) => kept.replacen(',', ".", 1),
        // "1.200,50" → "1200.50"
        (Some(comma), Some(dot)) if comma > dot => kept.replace('.', "").replacen(',', ".", 1),
        // "1,200.50" → "1200.50"
        (Some(_), Some(_)) => kept.replace(',', ""),
        _ => kept,
    }
}

/// Parse the longest leading `-?digits(.digits)?` run, ignoring whatever
/// follows it. Returns `None` when the prefix holds no digit at all.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &s[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        frac_part = &s[frac_start..end];
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let literal = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part },
    );

    literal.parse::<f64>().ok()
}

// ============================================================================
// ROUNDING & DISPLAY
// ============================================================================

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    // + 0.0 turns -0.0 into 0.0 so it never prints as "-0.00"
    (value * 100.0).round() / 100.0 + 0.0
}

/// Format an amount with a fixed currency symbol, e.g. `£1200.50`.
pub fn format_money(symbol: &str, value: f64) -> String {
    format!("{}{:.2}", symbol, round2(value))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_uk_thousands() {
        assert_eq!(normalize_amount("1,200.50"), 1200.50);
        assert_eq!(normalize_amount("£1,234,567.89"), 1234567.89);
    }

    #[test]
    fn test_continental_thousands() {
        assert_eq!(normalize_amount("1.200,50"), 1200.50);
        assert_eq!(normalize_amount("R$ 1.234.567,89"), 1234567.89);
    }

    #[test]
    fn test_currency_symbols_stripped() {
        assert_eq!(normalize_amount("R$ 45.00"), 45.00);
        assert_eq!(normalize_amount("$19.99"), 19.99);
        assert_eq!(normalize_amount("£ 7"), 7.0);
    }

    #[test]
    fn test_comma_only_is_decimal() {
        assert_eq!(normalize_amount("12,50"), 12.5);
        // only the first comma becomes a dot, the rest stops the parse
        assert_eq!(normalize_amount("1,200,300"), 1.2);
    }

    #[test]
    fn test_dot_only_is_decimal() {
        // inherited ambiguity: continental thousands without decimals
        assert_eq!(normalize_amount("1.200"), 1.2);
    }

    #[test]
    fn test_negative_becomes_absolute() {
        assert_eq!(normalize_amount("-45.99"), 45.99);
        assert_eq!(normalize_amount("-$855.94"), 855.94);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(normalize_amount("abc"), 0.0);
        assert_eq!(normalize_amount(""), 0.0);
        assert_eq!(normalize_amount("-"), 0.0);
        assert_eq!(normalize_amount("--5"), 0.0);
    }

    #[test]
    fn test_prefix_parsing() {
        assert_eq!(normalize_amount("1.2.3"), 1.2);
        assert_eq!(normalize_amount("12-3"), 12.0);
        assert_eq!(normalize_amount(".5"), 0.5);
        assert_eq!(normalize_amount("5."), 5.0);
    }

    #[test]
    fn test_never_negative() {
        let inputs = ["-0", "-1", "-1.200,50", "--", "-,5", "R$ -3,00", "0", "-.", "1-"];
        for input in inputs {
            let value = normalize_amount(input);
            assert!(value >= 0.0, "{:?} normalized to {}", input, value);
        }

        // overflows to infinity
        assert_eq!(normalize_amount(&"9".repeat(400)), 0.0);
    }

    #[test]
    fn test_parse_amount_strict() {
        assert_eq!(parse_amount("R$ 45,00"), Ok(45.0));
        assert_eq!(
            parse_amount("n/a"),
            Err(AmountError::Unparsable("n/a".to_string()))
        );
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert!(!round2(-0.001).is_sign_negative());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("£", 1200.5), "£1200.50");
        assert_eq!(format_money("R$", 0.0), "R$0.00");
        assert_eq!(format_money("£", -0.001), "£0.00");
    }
}
