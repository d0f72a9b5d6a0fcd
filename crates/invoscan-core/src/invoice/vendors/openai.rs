//! OpenAI receipts and invoices (ChatGPT subscriptions, API usage).

use lazy_static::lazy_static;
use regex::Regex;

use crate::invoice::rules::normalizer::normalize_identifier;
use crate::invoice::rules::patterns::PatternCatalog;
use crate::models::record::{FieldKey, FieldSet, FieldValue, VendorId};

use super::{VendorProfile, currency_after, currency_before, first_capture, text_field, total_fields};

const CANONICAL_NAME: &str = "OpenAI, LLC";

lazy_static! {
    static ref BRAND: Regex = Regex::new(r"(?i)\bOpenAI\b").unwrap();

    static ref CONFIRMATION: Regex = Regex::new(
        r"(?i)ChatGPT|OpenAI,?\s+(?:LLC|Ireland)"
    ).unwrap();

    static ref LEGAL_NAME: Vec<Regex> = vec![
        Regex::new(r"(?i)(OpenAI\s+Ireland\s+(?:Ltd\.?|Limited))").unwrap(),
        Regex::new(r"(?i)(OpenAI,?\s+L\.?L\.?C\.?)").unwrap(),
    ];

    static ref INVOICE_NUMBER: Vec<Regex> = vec![
        Regex::new(r"(?i)Invoice\s+number[:\s]*([\w\-]*\d[\w\-]*)").unwrap(),
        Regex::new(r"(?i)Receipt\s+number[:\s]*([\w\-]*\d[\w\-]*)").unwrap(),
    ];

    static ref DATE: Vec<Regex> = vec![
        Regex::new(r"(?i)Date\s+of\s+issue[:\s]*(\p{L}+\s+\d{1,2},\s+\d{4})").unwrap(),
        Regex::new(r"(?i)Date\s+paid[:\s]*(\p{L}+\s+\d{1,2},\s+\d{4})").unwrap(),
        Regex::new(r"(?i)paid\s+on\s+(\p{L}+\s+\d{1,2},\s+\d{4})").unwrap(),
    ];

    static ref TOTAL: Vec<Regex> = vec![
        currency_before(r"\$|€|£"),
        currency_after(r"(?:USD|EUR|GBP)\b"),
    ];

    static ref PRODUCT: Vec<Regex> = vec![
        Regex::new(r"(?i)(ChatGPT\s+(?:Plus|Pro|Team|Enterprise|Business))").unwrap(),
        Regex::new(r"(?i)(API\s+usage)").unwrap(),
    ];

    static ref DESCRIPTION: Vec<Regex> = vec![
        Regex::new(r"(?i)(ChatGPT[^\n]*Subscription[^\n]*)").unwrap(),
        Regex::new(r"(?i)(API\s+usage[^\n]*)").unwrap(),
    ];
}

/// OpenAI receipt layout (English only).
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiProfile;

impl VendorProfile for OpenAiProfile {
    fn id(&self) -> VendorId {
        VendorId::OpenAi
    }

    fn matches(&self, text: &str) -> bool {
        BRAND.is_match(text) && CONFIRMATION.is_match(text)
    }

    fn extract(&self, text: &str, catalog: &PatternCatalog) -> FieldSet {
        let (total_amount, currency) = total_fields(&TOTAL, text);

        FieldSet {
            date: first_capture(&DATE, text).map(FieldValue::text).unwrap_or_default(),
            vendor: FieldValue::text(first_capture(&LEGAL_NAME, text).unwrap_or(CANONICAL_NAME)),
            total_amount,
            currency,
            product: text_field(&PRODUCT, text, catalog, FieldKey::Product),
            description: text_field(&DESCRIPTION, text, catalog, FieldKey::Description),
            invoice_number: first_capture(&INVOICE_NUMBER, text)
                .and_then(normalize_identifier)
                .into(),
        }
    }
}
