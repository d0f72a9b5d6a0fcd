//! Generic field extraction for documents without a vendor profile.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::{ExtractionConfig, KnownVendor};
use crate::models::record::{FieldKey, FieldSet, FieldValue};

use super::rules::normalizer::normalize_amount;
use super::rules::patterns::{AMOUNT_SHAPE, NUMERIC_TOKEN, PatternCatalog, TOTAL_KEYWORD};

/// Applies the pattern catalog to raw text, then per-field fallbacks.
#[derive(Debug, Clone, Copy)]
pub struct GenericExtractor<'a> {
    catalog: &'a PatternCatalog,
    config: &'a ExtractionConfig,
}

impl<'a> GenericExtractor<'a> {
    pub fn new(catalog: &'a PatternCatalog, config: &'a ExtractionConfig) -> Self {
        Self { catalog, config }
    }

    /// Extract every field. Fields nothing matched are absent.
    pub fn extract(&self, text: &str) -> FieldSet {
        FieldSet {
            date: self.primary(FieldKey::Date, text),
            vendor: self
                .primary(FieldKey::Vendor, text)
                .or_else_with(|| known_vendor(text, &self.config.known_vendors)),
            total_amount: self
                .primary(FieldKey::TotalAmount, text)
                .or_else_with(|| total_from_keyword_lines(text).map(FieldValue::Amount))
                .or_else_with(|| largest_amount(text).map(FieldValue::Amount)),
            currency: self.primary(FieldKey::Currency, text),
            product: self.primary(FieldKey::Product, text),
            description: self.primary(FieldKey::Description, text),
            invoice_number: self.primary(FieldKey::InvoiceNumber, text).or_else_with(|| {
                first_digit_run(text, self.config.min_digit_run)
                    .map(|run| FieldValue::Text(run.to_string()))
            }),
        }
    }

    fn primary(&self, field: FieldKey, text: &str) -> FieldValue {
        self.catalog.rule(field).apply(text)
    }
}

trait FallbackExt {
    fn or_else_with(self, fallback: impl FnOnce() -> Option<FieldValue>) -> FieldValue;
}

impl FallbackExt for FieldValue {
    fn or_else_with(self, fallback: impl FnOnce() -> Option<FieldValue>) -> FieldValue {
        if self.is_present() {
            self
        } else {
            fallback().unwrap_or_default()
        }
    }
}

/// Last numeric token on the last total-keyword line that yields an amount.
pub fn total_from_keyword_lines(text: &str) -> Option<Decimal> {
    let total = text
        .lines()
        .rev()
        .filter(|line| TOTAL_KEYWORD.is_match(line))
        .find_map(|line| {
            NUMERIC_TOKEN
                .find_iter(line)
                .last()
                .and_then(|m| normalize_amount(m.as_str()))
        });

    if let Some(amount) = total {
        debug!(%amount, "total taken from keyword line");
    }
    total
}

/// Largest decimal-shaped number anywhere in the text.
pub fn largest_amount(text: &str) -> Option<Decimal> {
    let largest = AMOUNT_SHAPE
        .captures_iter(text)
        .filter_map(|caps| normalize_amount(&caps[1]))
        .max();

    if let Some(amount) = largest {
        debug!(%amount, "total taken as largest amount on page");
    }
    largest
}

/// First run of at least `min_len` consecutive ASCII digits.
pub fn first_digit_run(text: &str, min_len: usize) -> Option<&str> {
    let min_len = min_len.max(1);
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (c.is_ascii_digit(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_len {
                    return Some(&text[s..i]);
                }
                start = None;
            }
            _ => {}
        }
    }

    start
        .filter(|s| text.len() - s >= min_len)
        .map(|s| &text[s..])
}

/// Canonical name of the first known vendor mentioned in the text.
pub fn known_vendor(text: &str, known: &[KnownVendor]) -> Option<FieldValue> {
    let haystack = text.to_lowercase();
    known
        .iter()
        .find(|v| !v.needle.is_empty() && haystack.contains(&v.needle.to_lowercase()))
        .map(|v| {
            debug!(needle = %v.needle, "vendor taken from known names");
            FieldValue::text(v.canonical.clone())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn extract(text: &str) -> FieldSet {
        let catalog = PatternCatalog::builtin();
        let config = ExtractionConfig::default();
        GenericExtractor::new(&catalog, &config).extract(text)
    }

    fn amount(s: &str) -> FieldValue {
        FieldValue::Amount(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_extract_spanish_invoice() {
        let text = r#"
            FACTURA
            Factura Nº: F-2024/0153
            Fecha: 12/03/2024
            Proveedor: Distribuciones Levante S.L.
            Descripción: Altavoz portátil
            ALTAVOZ BT-40 1 ud 45,00
            Total factura: 54,45 EUR
        "#;

        let fields = extract(text);

        assert_eq!(fields.invoice_number, FieldValue::text("F-2024/0153"));
        assert_eq!(fields.date, FieldValue::text("12/03/2024"));
        assert_eq!(fields.vendor, FieldValue::text("Distribuciones Levante S.L."));
        assert_eq!(fields.description, FieldValue::text("Altavoz portátil"));
        assert_eq!(fields.product, FieldValue::text("Altavoz portátil"));
        assert_eq!(fields.total_amount, amount("54.45"));
        assert_eq!(fields.currency, FieldValue::text("EUR"));
    }

    #[test]
    fn test_total_with_currency_label() {
        let fields = extract("Resumen\nTotal: EUR 1.234,56\n");
        assert_eq!(fields.total_amount, amount("1234.56"));
    }

    #[test]
    fn test_labeled_total_beats_larger_number() {
        let fields = extract("Pedido 9.999,99\nTotal factura: 50,00");
        assert_eq!(fields.total_amount, amount("50.00"));
    }

    #[test]
    fn test_total_keyword_line_fallback() {
        // No decimal-shaped numbers, and "Gesamt" is not a labeled pattern.
        let text = "Rechnung\nPosten 3\nGesamt inkl. MwSt 120\nDanke";
        assert_eq!(total_from_keyword_lines(text), Decimal::from_str("120").ok());
        assert_eq!(extract(text).total_amount, amount("120"));
    }

    #[test]
    fn test_total_largest_amount_fallback() {
        let text = "Linea 12,50\nOtra 1.020,00\nEnvio 4,99";
        assert_eq!(largest_amount(text), Decimal::from_str("1020.00").ok());
    }

    #[test]
    fn test_unnormalizable_labeled_total_falls_back() {
        // The labeled pattern wins but captures garbage; fallbacks take over.
        let text = "Total: --,--\nImporte neto 80,00\nIVA 16,80";
        let fields = extract(text);
        assert_eq!(fields.total_amount, amount("80.00"));
    }

    #[test]
    fn test_invoice_number_digit_run_fallback() {
        let text = "Order summary\n300012345678901234 placed by buyer";
        let fields = extract(text);
        assert_eq!(fields.invoice_number, FieldValue::text("300012345678901234"));
    }

    #[test]
    fn test_first_digit_run() {
        assert_eq!(first_digit_run("ab 12345 cd", 5), Some("12345"));
        assert_eq!(first_digit_run("ab 1234 cd", 5), None);
        assert_eq!(first_digit_run("x 12 y 1234567", 7), Some("1234567"));
        assert_eq!(first_digit_run("", 3), None);
    }

    #[test]
    fn test_vendor_known_name_fallback() {
        let fields = extract("Pedido realizado en amazon.es\nTotal: 19,99");
        assert_eq!(fields.vendor, FieldValue::text("Amazon EU S.à r.l."));
    }

    #[test]
    fn test_empty_text_is_all_absent() {
        assert_eq!(extract(""), FieldSet::absent());
        assert_eq!(extract("   \n\t"), FieldSet::absent());
    }
}
