//! Core library for invoice field extraction from OCR text.
//!
//! This crate provides:
//! - Amount normalization for locale-formatted numbers
//! - A multilingual pattern catalog with per-field fallbacks
//! - Vendor profiles for known invoice layouts
//! - Reliability scoring and manual-review triage
//!
//! OCR itself is out of scope: the input is the recognized text of one document.

pub mod error;
pub mod invoice;
pub mod models;

pub use error::{InvoscanError, Result};
pub use invoice::{
    GenericExtractor, InvoiceExtractor, InvoiceScanner, PatternCatalog, TriagePolicy,
    VendorProfile, VendorRegistry,
};
pub use models::config::ScanConfig;
pub use models::record::{ExtractionRecord, FieldKey, FieldSet, FieldValue, TriageState, VendorId};
