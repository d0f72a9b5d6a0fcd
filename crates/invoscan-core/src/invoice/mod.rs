//! Invoice field extraction module.

pub mod generic;
pub mod rules;
pub mod scanner;
pub mod scoring;
pub mod vendors;

pub use generic::GenericExtractor;
pub use rules::PatternCatalog;
pub use scanner::InvoiceScanner;
pub use scoring::{TriagePolicy, score, triage};
pub use vendors::{VendorProfile, VendorRegistry};

use crate::models::record::ExtractionRecord;

/// Trait for invoice field extractors.
pub trait InvoiceExtractor {
    /// Extract and score invoice fields from plain text.
    fn extract_from_text(&self, text: &str) -> ExtractionRecord;
}
