//! Document-level pipeline: classify, extract, score.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::models::config::ScanConfig;
use crate::models::record::ExtractionRecord;

use super::InvoiceExtractor;
use super::generic::GenericExtractor;
use super::rules::patterns::PatternCatalog;
use super::vendors::VendorRegistry;

/// Turns the recognized text of one document into an [`ExtractionRecord`].
///
/// Documents carrying a known vendor signature go to that vendor's extractor
/// and are trusted outright. Everything else goes through the generic
/// extractor and is scored for manual review.
///
/// The scanner holds no mutable state, so one instance can serve many
/// threads at once.
#[derive(Debug)]
pub struct InvoiceScanner {
    catalog: PatternCatalog,
    vendors: VendorRegistry,
    config: ScanConfig,
}

impl InvoiceScanner {
    /// Scanner with built-in patterns, all vendor profiles and default thresholds.
    pub fn new() -> Self {
        Self {
            catalog: PatternCatalog::builtin(),
            vendors: VendorRegistry::builtin(),
            config: ScanConfig::default(),
        }
    }

    /// Scanner configured from `config`.
    ///
    /// Fails when a custom pattern does not compile or a threshold is out of range.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        let catalog = PatternCatalog::with_custom(&config.extraction.custom_patterns)?;
        let vendors = if config.extraction.vendor_profiles {
            VendorRegistry::builtin()
        } else {
            VendorRegistry::empty()
        };

        Ok(Self {
            catalog,
            vendors,
            config: config.clone(),
        })
    }

    /// Replace the vendor registry.
    pub fn with_vendors(mut self, vendors: VendorRegistry) -> Self {
        self.vendors = vendors;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn vendors(&self) -> &VendorRegistry {
        &self.vendors
    }

    /// Extract and score one document's text.
    pub fn scan(&self, text: &str) -> ExtractionRecord {
        let start = Instant::now();
        debug!("Scanning {} characters of text", text.len());

        let record = match self.vendors.profile(text) {
            Some(profile) => {
                let fields = profile.extract(text, &self.catalog);
                ExtractionRecord::trusted(fields, profile.id())
            }
            None => {
                let fields = GenericExtractor::new(&self.catalog, &self.config.extraction).extract(text);
                ExtractionRecord::scored(fields, &self.config.triage)
            }
        };

        debug!(
            vendor = ?record.vendor_profile(),
            present = record.fields().present_count(),
            score = record.reliability_score(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "document scanned"
        );
        record
    }

    /// Extract and score a named document.
    pub fn scan_document(&self, name: &str, text: &str) -> ExtractionRecord {
        let record = self.scan(text).with_source(name);

        info!(
            "{}: {} ({} fields, score {:.2})",
            name,
            record.triage_state(),
            record.fields().present_count(),
            record.reliability_score()
        );
        record
    }
}

impl Default for InvoiceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for InvoiceScanner {
    fn extract_from_text(&self, text: &str) -> ExtractionRecord {
        self.scan(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvoscanError;
    use crate::models::config::CustomPattern;
    use crate::models::record::{FieldKey, FieldValue, TriageState, VendorId};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::Arc;

    const GENERIC_COMPLETE: &str = r#"
FACTURA
Factura Nº: 2024-0087
Fecha: 03/04/2024
Proveedor: Papelería Central S.L.
Descripción: Pizarra blanca 90x60
Moneda: EUR
Total factura: 89,90 EUR
"#;

    #[test]
    fn test_generic_complete_document_is_ok() {
        let record = InvoiceScanner::new().scan(GENERIC_COMPLETE);

        assert_eq!(record.vendor_profile(), None);
        assert_eq!(record.fields().present_count(), 7);
        assert_eq!(record.reliability_score(), 1.0);
        assert_eq!(record.triage_state(), TriageState::Ok);
        assert_eq!(
            record.get(FieldKey::TotalAmount),
            &FieldValue::Amount(Decimal::from_str("89.90").unwrap())
        );
    }

    #[test]
    fn test_sparse_generic_document_needs_review() {
        let record = InvoiceScanner::new().scan("Gracias por su visita\nTotal: 12,00");

        assert!(record.reliability_score() < 0.6);
        assert_eq!(record.triage_state(), TriageState::NeedsReview);
        assert!(record.needs_review());
    }

    #[test]
    fn test_vendor_document_is_trusted_with_absent_fields() {
        let record = InvoiceScanner::new().scan("Amazon Services Europe\nGracias por su compra");

        assert_eq!(record.vendor_profile(), Some(VendorId::Amazon));
        assert!(record.fields().absent_count() >= 2);
        assert_eq!(record.reliability_score(), 1.0);
        assert_eq!(record.triage_state(), TriageState::Ok);
    }

    #[test]
    fn test_vendor_profiles_can_be_disabled() {
        let mut config = ScanConfig::default();
        config.extraction.vendor_profiles = false;
        let scanner = InvoiceScanner::from_config(&config).unwrap();

        let record = scanner.scan("Amazon Services Europe\nGracias por su compra");
        assert_eq!(record.vendor_profile(), None);
        assert_eq!(record.triage_state(), TriageState::NeedsReview);

        let record = InvoiceScanner::new()
            .with_vendors(VendorRegistry::empty())
            .scan("Amazon Services Europe");
        assert_eq!(record.vendor_profile(), None);
    }

    #[test]
    fn test_space_grouped_total() {
        let record = InvoiceScanner::new().scan("Facture\nMontant total: 1 234,56 €");

        assert_eq!(
            record.get(FieldKey::TotalAmount),
            &FieldValue::Amount(Decimal::from_str("1234.56").unwrap())
        );
        assert_eq!(record.get(FieldKey::Currency), &FieldValue::text("EUR"));
    }

    #[test]
    fn test_vendor_total_ignores_address_below() {
        let text = "Amazon Services Europe S.à r.l.\nTOTAL: 30,00 €\n38 avenue John F. Kennedy, L-1855 Luxembourg";
        let record = InvoiceScanner::new().scan(text);

        assert_eq!(record.vendor_profile(), Some(VendorId::Amazon));
        assert_eq!(
            record.get(FieldKey::TotalAmount),
            &FieldValue::Amount(Decimal::from_str("30.00").unwrap())
        );
    }

    #[test]
    fn test_empty_text() {
        let record = InvoiceScanner::new().scan("");

        assert_eq!(record.fields().present_count(), 0);
        assert_eq!(record.reliability_score(), 0.0);
        assert_eq!(record.triage_state(), TriageState::NeedsReview);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let scanner = InvoiceScanner::new();
        assert_eq!(scanner.scan(GENERIC_COMPLETE), scanner.scan(GENERIC_COMPLETE));
    }

    #[test]
    fn test_scan_document_records_source() {
        let record = InvoiceScanner::new().scan_document("factura_0087.txt", GENERIC_COMPLETE);
        assert_eq!(record.source_filename(), Some("factura_0087.txt"));
    }

    #[test]
    fn test_custom_pattern_from_config() {
        let mut config = ScanConfig::default();
        config.extraction.custom_patterns.push(CustomPattern {
            field: FieldKey::InvoiceNumber,
            pattern: r"Ticket\s+(\d+)".to_string(),
        });
        let scanner = InvoiceScanner::from_config(&config).unwrap();

        let record = scanner.scan("Ticket 5521\nFactura 0001");
        assert_eq!(record.get(FieldKey::InvoiceNumber), &FieldValue::text("5521"));
    }

    #[test]
    fn test_invalid_custom_pattern_fails_construction() {
        let mut config = ScanConfig::default();
        config.extraction.custom_patterns.push(CustomPattern {
            field: FieldKey::Date,
            pattern: "[".to_string(),
        });
        assert!(matches!(
            InvoiceScanner::from_config(&config),
            Err(InvoscanError::Pattern { .. })
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let scanner = Arc::new(InvoiceScanner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let scanner = Arc::clone(&scanner);
                std::thread::spawn(move || scanner.scan(GENERIC_COMPLETE))
            })
            .collect();

        let expected = scanner.scan(GENERIC_COMPLETE);
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
