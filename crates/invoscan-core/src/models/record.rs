//! Extraction record data model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

use crate::invoice::rules::dates::parse_invoice_date;
use crate::invoice::rules::normalizer::format_amount;
use crate::invoice::scoring::{TriagePolicy, triage};

/// Invoice attributes recognized by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Date,
    Vendor,
    TotalAmount,
    Currency,
    Product,
    Description,
    InvoiceNumber,
}

impl FieldKey {
    /// All keys, in report column order.
    pub const ALL: [FieldKey; 7] = [
        FieldKey::Date,
        FieldKey::Vendor,
        FieldKey::TotalAmount,
        FieldKey::Currency,
        FieldKey::Product,
        FieldKey::Description,
        FieldKey::InvoiceNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Date => "date",
            FieldKey::Vendor => "vendor",
            FieldKey::TotalAmount => "total_amount",
            FieldKey::Currency => "currency",
            FieldKey::Product => "product",
            FieldKey::Description => "description",
            FieldKey::InvoiceNumber => "invoice_number",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s.trim())
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

/// Value of a single field: either found (and normalized) or explicitly absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    /// No pattern matched, or the match could not be normalized.
    #[default]
    Absent,
    /// Raw text value.
    Text(String),
    /// Normalized monetary amount.
    Amount(Decimal),
}

impl FieldValue {
    /// Build a text value; blank strings are absent.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::Text(value)
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, FieldValue::Absent)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(d) => Some(*d),
            _ => None,
        }
    }

    /// Render for tabular output, substituting `marker` for absent values.
    pub fn display_or(&self, marker: &str) -> String {
        match self {
            FieldValue::Absent => marker.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Amount(d) => format_amount(*d),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Absent => serde_json::Value::Null,
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Amount(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl From<Option<Decimal>> for FieldValue {
    fn from(value: Option<Decimal>) -> Self {
        value.map(FieldValue::Amount).unwrap_or_default()
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::text).unwrap_or_default()
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Amount(d) => Serialize::serialize(d, serializer),
        }
    }
}

/// One value for every [`FieldKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    pub date: FieldValue,
    pub vendor: FieldValue,
    pub total_amount: FieldValue,
    pub currency: FieldValue,
    pub product: FieldValue,
    pub description: FieldValue,
    pub invoice_number: FieldValue,
}

impl FieldSet {
    /// A field set with every field absent.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn get(&self, key: FieldKey) -> &FieldValue {
        match key {
            FieldKey::Date => &self.date,
            FieldKey::Vendor => &self.vendor,
            FieldKey::TotalAmount => &self.total_amount,
            FieldKey::Currency => &self.currency,
            FieldKey::Product => &self.product,
            FieldKey::Description => &self.description,
            FieldKey::InvoiceNumber => &self.invoice_number,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &FieldValue)> + '_ {
        FieldKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }

    pub fn present_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_present()).count()
    }

    pub fn absent_count(&self) -> usize {
        FieldKey::ALL.len() - self.present_count()
    }

    /// Keys whose value is absent.
    pub fn missing_fields(&self) -> Vec<FieldKey> {
        self.iter()
            .filter(|(_, v)| !v.is_present())
            .map(|(k, _)| k)
            .collect()
    }
}

/// Whether a record can be trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriageState {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NEEDS_REVIEW")]
    NeedsReview,
}

impl TriageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriageState::Ok => "OK",
            TriageState::NeedsReview => "NEEDS_REVIEW",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TriageState::Ok => "ok",
            TriageState::NeedsReview => "needs manual review",
        }
    }
}

impl fmt::Display for TriageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known vendor layouts with dedicated extractors, in classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorId {
    /// Large online retailer (EU marketplace invoices).
    Amazon,
    /// AI subscription provider receipts.
    OpenAi,
    /// Wholesale marketplace orders.
    Alibaba,
}

impl VendorId {
    /// Classification priority: the first signature that matches wins.
    pub const PRIORITY: [VendorId; 3] = [VendorId::Amazon, VendorId::OpenAi, VendorId::Alibaba];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorId::Amazon => "amazon",
            VendorId::OpenAi => "openai",
            VendorId::Alibaba => "alibaba",
        }
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields extracted from one document, with reliability and triage.
///
/// Records are built once, either scored from their field presence or
/// trusted because a vendor profile produced them, and are read-only after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    source_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor_profile: Option<VendorId>,
    fields: FieldSet,
    reliability_score: f64,
    triage_state: TriageState,
}

impl ExtractionRecord {
    /// Record from the generic extractor, scored under `policy`.
    pub fn scored(fields: FieldSet, policy: &TriagePolicy) -> Self {
        let (reliability_score, triage_state) = triage(&fields, policy);
        Self {
            source_filename: None,
            vendor_profile: None,
            fields,
            reliability_score,
            triage_state,
        }
    }

    /// Record from a vendor profile: fully trusted regardless of absent fields.
    pub fn trusted(fields: FieldSet, vendor: VendorId) -> Self {
        Self {
            source_filename: None,
            vendor_profile: Some(vendor),
            fields,
            reliability_score: 1.0,
            triage_state: TriageState::Ok,
        }
    }

    /// Attach the name of the source document.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_filename = Some(name.into());
        self
    }

    pub fn source_filename(&self) -> Option<&str> {
        self.source_filename.as_deref()
    }

    pub fn vendor_profile(&self) -> Option<VendorId> {
        self.vendor_profile
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn get(&self, key: FieldKey) -> &FieldValue {
        self.fields.get(key)
    }

    pub fn reliability_score(&self) -> f64 {
        self.reliability_score
    }

    pub fn triage_state(&self) -> TriageState {
        self.triage_state
    }

    pub fn needs_review(&self) -> bool {
        self.triage_state == TriageState::NeedsReview
    }

    /// Calendar date parsed from the raw date field, when recognizable.
    pub fn issue_date(&self) -> Option<NaiveDate> {
        self.fields.date.as_text().and_then(parse_invoice_date)
    }

    /// Flatten into a field-name to value mapping for tabular reports.
    pub fn to_row(&self) -> BTreeMap<String, serde_json::Value> {
        let mut row: BTreeMap<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value.to_json()))
            .collect();

        row.insert(
            "source_filename".to_string(),
            self.source_filename
                .clone()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        );
        row.insert(
            "reliability_score".to_string(),
            serde_json::Number::from_f64(self.reliability_score)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        );
        row.insert(
            "triage_state".to_string(),
            serde_json::Value::String(self.triage_state.as_str().to_string()),
        );

        row
    }
}
