//! Amazon EU marketplace invoices (Spanish, English, French, German, Italian).

use lazy_static::lazy_static;
use regex::Regex;

use crate::invoice::rules::normalizer::normalize_identifier;
use crate::invoice::rules::patterns::PatternCatalog;
use crate::models::record::{FieldKey, FieldSet, FieldValue, VendorId};

use super::{VendorProfile, currency_after, currency_before, first_capture, line_after, total_fields};

const CANONICAL_NAME: &str = "Amazon EU S.à r.l.";

lazy_static! {
    static ref SIGNATURE: Regex = Regex::new(
        r"(?i)amazon\s+services\s+europe|amazon\s+eu\s+s\.?\s?[àa]\.?\s?r\.?\s?l"
    ).unwrap();

    static ref INVOICE_NUMBER: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:N[úu]mero\s+de\s+(?:la\s+)?factura|Invoice\s+number|Num[ée]ro\s+de\s+(?:la\s+)?facture|Rechnungsnummer|Numero\s+(?:della\s+)?fattura)[:\s]*([A-Z]{2}-[\w\-]*\d[\w\-]*)"
        ).unwrap(),
        Regex::new(
            r"(?i)(?:N[úu]mero\s+de\s+(?:la\s+)?factura|Invoice\s+number|Num[ée]ro\s+de\s+(?:la\s+)?facture|Rechnungsnummer|Numero\s+(?:della\s+)?fattura)[:\s]*([\w\-]*\d[\w\-]*)"
        ).unwrap(),
    ];

    static ref DATE: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:Fecha\s+de\s+(?:la\s+)?factura|Invoice\s+date|Date\s+de\s+(?:la\s+)?facture|Rechnungsdatum|Data\s+(?:della\s+)?fattura)[:\s/]*(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4}|\d{1,2}\.?\s+\p{L}+\s+\d{4})"
        ).unwrap(),
        Regex::new(
            r"(?i)(?:Fecha\s+del\s+pedido|Order\s+date|Date\s+de\s+(?:la\s+)?commande|Bestelldatum)[:\s]*(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4}|\d{1,2}\.?\s+\p{L}+\s+\d{4})"
        ).unwrap(),
    ];

    static ref TOTAL: Vec<Regex> = vec![
        currency_before("EUR|GBP|€|£"),
        currency_after("EUR|GBP|€|£"),
    ];

    static ref SELLER: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:Vendido\s+por|Sold\s+by|Vendu\s+par|Verkauft\s+von|Venduto\s+da)[:\s]*(.+)").unwrap(),
    ];

    static ref ITEM_HEADER: Regex = Regex::new(
        r"(?i)^\s*(?:Descripci[óo]n|Description|Beschreibung|Descrizione)\b"
    ).unwrap();
}

/// Amazon marketplace invoice layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmazonProfile;

impl VendorProfile for AmazonProfile {
    fn id(&self) -> VendorId {
        VendorId::Amazon
    }

    fn matches(&self, text: &str) -> bool {
        SIGNATURE.is_match(text)
    }

    fn extract(&self, text: &str, catalog: &PatternCatalog) -> FieldSet {
        let (total_amount, currency) = total_fields(&TOTAL, text);

        // The item line sits under the table header.
        let item = line_after(text, &ITEM_HEADER).map(FieldValue::text);

        FieldSet {
            date: first_capture(&DATE, text).map(FieldValue::text).unwrap_or_default(),
            vendor: first_capture(&SELLER, text)
                .map(|s| FieldValue::text(s.trim()))
                .unwrap_or_else(|| FieldValue::text(CANONICAL_NAME)),
            total_amount,
            currency,
            product: item
                .clone()
                .unwrap_or_else(|| catalog.rule(FieldKey::Product).apply(text)),
            description: item.unwrap_or_else(|| catalog.rule(FieldKey::Description).apply(text)),
            invoice_number: first_capture(&INVOICE_NUMBER, text)
                .and_then(normalize_identifier)
                .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const INVOICE: &str = r#"
Amazon Services Europe S.à r.l.
Factura
Número de la factura: ES-2191673415-2024-4
Fecha de la factura: 15.01.2024
Vendido por: Amazon EU S.à r.l., Sucursal en España
Descripción           Cant.   Precio unitario   IVA
Casco de bicicleta urbano talla M   1   EUR 24,79   21%
Subtotal EUR 24,79
IVA EUR 5,21
TOTAL: EUR 30,00
"#;

    fn extract(text: &str) -> FieldSet {
        AmazonProfile.extract(text, &PatternCatalog::builtin())
    }

    #[test]
    fn test_signature() {
        assert!(AmazonProfile.matches("AMAZON SERVICES EUROPE"));
        assert!(AmazonProfile.matches("Amazon EU S.a r.l."));
        assert!(AmazonProfile.matches("amazon eu s.à r.l"));
        assert!(!AmazonProfile.matches("Pedido en amazon.es"));
    }

    #[test]
    fn test_extract_spanish_invoice() {
        let fields = extract(INVOICE);

        assert_eq!(fields.invoice_number, FieldValue::text("ES-2191673415-2024-4"));
        assert_eq!(fields.date, FieldValue::text("15.01.2024"));
        assert_eq!(
            fields.vendor,
            FieldValue::text("Amazon EU S.à r.l., Sucursal en España")
        );
        assert_eq!(
            fields.total_amount,
            FieldValue::Amount(Decimal::from_str("30.00").unwrap())
        );
        assert_eq!(fields.currency, FieldValue::text("EUR"));
        assert_eq!(
            fields.product,
            FieldValue::text("Casco de bicicleta urbano talla M   1   EUR 24,79   21%")
        );
        assert_eq!(fields.description, fields.product);
    }

    #[test]
    fn test_total_is_last_tagged_amount() {
        let text = "Amazon Services Europe\nArtículo 150,00 €\nReembolso -120,00 €\nTotal 30,00 €";
        let fields = extract(text);
        assert_eq!(
            fields.total_amount,
            FieldValue::Amount(Decimal::from_str("30.00").unwrap())
        );
        assert_eq!(fields.currency, FieldValue::text("EUR"));
    }

    #[test]
    fn test_address_after_total_is_not_an_amount() {
        let text = "Amazon Services Europe S.à r.l.\nFactura\nTOTAL: 30,00 €\n38 avenue John F. Kennedy, L-1855 Luxembourg";
        let fields = extract(text);
        assert_eq!(
            fields.total_amount,
            FieldValue::Amount(Decimal::from_str("30.00").unwrap())
        );
        assert_eq!(fields.currency, FieldValue::text("EUR"));
    }

    #[test]
    fn test_no_tagged_amount_leaves_total_and_currency_absent() {
        let fields = extract("Amazon Services Europe\nGracias por su compra");
        assert_eq!(fields.total_amount, FieldValue::Absent);
        assert_eq!(fields.currency, FieldValue::Absent);
        assert_eq!(fields.invoice_number, FieldValue::Absent);
        assert_eq!(fields.vendor, FieldValue::text(CANONICAL_NAME));
    }
}
