//! Normalization of locale-formatted amounts and invoice identifiers.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Currency codes stripped before parsing (compared upper-cased).
const CURRENCY_CODES: [&str; 7] = ["EUR", "USD", "GBP", "PLN", "SEK", "CHF", "ZŁ"];

/// Currency symbols stripped before parsing.
const CURRENCY_SYMBOLS: [char; 3] = ['€', '$', '£'];

/// Parse a locale-formatted amount such as `"1.234,56 €"` or `"−12,00"`.
///
/// When both `,` and `.` appear, whichever comes last is the decimal point
/// and the other is a thousands separator. A lone comma is a decimal point.
/// A separator that repeats without the other kind is thousands grouping.
/// The result is rounded to two decimal places. Anything unparseable yields
/// `None`; this function never panics.
///
/// US-formatted thousands with no decimals (`"1,234"`) read as `1.23`.
pub fn normalize_amount(raw: &str) -> Option<Decimal> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .map(|c| match c {
            '\u{2212}' | '\u{2013}' => '-',
            _ => c,
        })
        .collect::<String>()
        .to_uppercase();

    for code in CURRENCY_CODES {
        cleaned = cleaned.replace(code, "");
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (1, 0) => cleaned.replace(',', "."),
        (_, 0) => cleaned.replace(',', ""),
        (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        _ => match (cleaned.rfind(','), cleaned.rfind('.')) {
            (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
            _ => cleaned.replace(',', ""),
        },
    };

    Decimal::from_str(&normalized)
        .ok()
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Clean a captured invoice identifier.
///
/// Strips whitespace and surrounding punctuation. Captures without any digit
/// (words such as "de" or "No" picked up by loose label patterns) yield `None`.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c: char| !c.is_alphanumeric());

    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Format an amount with exactly two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_locale_formats() {
        assert_eq!(normalize_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("123,45"), Some(dec("123.45")));
        assert_eq!(normalize_amount("1234.56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("−12,00"), Some(dec("-12.00")));
        assert_eq!(normalize_amount("1,234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn test_currency_and_whitespace_stripped() {
        assert_eq!(normalize_amount("EUR 1.234,56"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("€ 50,00"), Some(dec("50.00")));
        assert_eq!(normalize_amount("$20.00"), Some(dec("20.00")));
        assert_eq!(normalize_amount("1\u{00a0}234,56 zł"), Some(dec("1234.56")));
        assert_eq!(normalize_amount("99,90 usd"), Some(dec("99.90")));
    }

    #[test]
    fn test_repeated_separator_is_grouping() {
        assert_eq!(normalize_amount("1.234.567"), Some(dec("1234567")));
        assert_eq!(normalize_amount("1,234,567"), Some(dec("1234567")));
        assert_eq!(normalize_amount("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn test_us_thousands_ambiguity_preserved() {
        assert_eq!(normalize_amount("1,234"), Some(dec("1.23")));
    }

    #[test]
    fn test_rounds_to_two_places() {
        assert_eq!(normalize_amount("10,005"), Some(dec("10.01")));
        assert_eq!(normalize_amount("3.14159"), Some(dec("3.14")));
    }

    #[test]
    fn test_garbage_is_absent() {
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("12-50"), None);
        assert_eq!(normalize_amount("--,--"), None);
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(
            normalize_identifier(" ES-2191673415-2024-4. "),
            Some("ES-2191673415-2024-4".to_string())
        );
        assert_eq!(normalize_identifier("FV/001/2024/"), Some("FV/001/2024".to_string()));
        assert_eq!(normalize_identifier("de"), None);
        assert_eq!(normalize_identifier(""), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("1234.5")), "1234.50");
        assert_eq!(format_amount(dec("-12")), "-12.00");
    }
}
