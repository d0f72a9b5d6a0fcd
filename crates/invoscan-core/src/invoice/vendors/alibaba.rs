//! Alibaba.com wholesale orders and Trade Assurance invoices.

use lazy_static::lazy_static;
use regex::Regex;

use crate::invoice::generic::first_digit_run;
use crate::invoice::rules::normalizer::normalize_identifier;
use crate::invoice::rules::patterns::PatternCatalog;
use crate::models::record::{FieldKey, FieldSet, FieldValue, VendorId};

use super::{VendorProfile, currency_after, currency_before, first_capture, text_field, total_fields};

const CANONICAL_NAME: &str = "Alibaba.com Singapore E-Commerce Private Limited";

/// Alibaba order numbers are long digit runs.
const ORDER_ID_DIGITS: usize = 15;

lazy_static! {
    static ref DOMAIN: Regex = Regex::new(r"(?i)alibaba\.com").unwrap();
    static ref BRAND: Regex = Regex::new(r"(?i)\balibaba\b").unwrap();
    static ref TRADE_ASSURANCE: Regex = Regex::new(r"(?i)trade\s+assurance").unwrap();

    static ref INVOICE_NUMBER: Vec<Regex> = vec![
        Regex::new(r"(?i)Invoice\s+(?:No\.?|number)[:\s#]*([\w\-]*\d[\w\-]*)").unwrap(),
        Regex::new(r"(?i)Order\s+(?:No\.?|number|ID)[:\s#]*(\d{6,})").unwrap(),
    ];

    static ref DATE: Vec<Regex> = vec![
        Regex::new(
            r"(?i)(?:Invoice|Order|Payment)\s+date[:\s]*(\d{4}-\d{2}-\d{2}|\p{L}+\.?\s+\d{1,2},\s+\d{4}|\d{1,2}[./\-]\d{1,2}[./\-]\d{4})"
        ).unwrap(),
    ];

    static ref TOTAL: Vec<Regex> = vec![
        currency_before(r"US ?\$|USD|EUR|€|\$"),
        currency_after(r"(?:USD|EUR)\b"),
    ];

    static ref SUPPLIER: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:Supplier|Seller|Sold\s+by)(?:\s+name)?[ \t]*:[ \t]*(.+)").unwrap(),
    ];

    static ref PRODUCT: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:Product\s+name|Product|Item)[ \t]*:[ \t]*(.+)").unwrap(),
    ];
}

/// Alibaba.com order layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlibabaProfile;

impl VendorProfile for AlibabaProfile {
    fn id(&self) -> VendorId {
        VendorId::Alibaba
    }

    fn matches(&self, text: &str) -> bool {
        DOMAIN.is_match(text) || (BRAND.is_match(text) && TRADE_ASSURANCE.is_match(text))
    }

    fn extract(&self, text: &str, catalog: &PatternCatalog) -> FieldSet {
        let (total_amount, currency) = total_fields(&TOTAL, text);

        let invoice_number = first_capture(&INVOICE_NUMBER, text)
            .or_else(|| first_digit_run(text, ORDER_ID_DIGITS))
            .and_then(normalize_identifier);

        FieldSet {
            date: first_capture(&DATE, text).map(FieldValue::text).unwrap_or_default(),
            vendor: text_field(&SUPPLIER, text, catalog, FieldKey::Vendor)
                .or_canonical(CANONICAL_NAME),
            total_amount,
            currency,
            product: text_field(&PRODUCT, text, catalog, FieldKey::Product),
            description: catalog.rule(FieldKey::Description).apply(text),
            invoice_number: invoice_number.into(),
        }
    }
}

trait CanonicalExt {
    fn or_canonical(self, name: &str) -> FieldValue;
}

impl CanonicalExt for FieldValue {
    fn or_canonical(self, name: &str) -> FieldValue {
        if self.is_present() { self } else { FieldValue::text(name) }
    }
}
