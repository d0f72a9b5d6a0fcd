//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{InvoscanError, Result};
use crate::invoice::scoring::TriagePolicy;
use crate::models::record::FieldKey;

/// Main configuration for invoscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Reliability thresholds for the generic extractor.
    pub triage: TriagePolicy,

    /// Report output configuration.
    pub report: ReportConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Route documents matching a vendor signature to that vendor's extractor.
    pub vendor_profiles: bool,

    /// Minimum run of consecutive digits accepted as a fallback invoice number.
    pub min_digit_run: usize,

    /// Name fragments mapped to canonical vendor names, checked when no
    /// labeled vendor pattern matched.
    pub known_vendors: Vec<KnownVendor>,

    /// Extra patterns tried before the built-in ones for their field.
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            vendor_profiles: true,
            min_digit_run: 15,
            known_vendors: vec![
                KnownVendor::new("Amazon", "Amazon EU S.à r.l."),
                KnownVendor::new("OpenAI", "OpenAI, LLC"),
                KnownVendor::new("Alibaba", "Alibaba.com Singapore E-Commerce Private Limited"),
            ],
            custom_patterns: Vec::new(),
        }
    }
}

/// A vendor name fragment and the legal name it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownVendor {
    /// Case-insensitive substring to look for.
    pub needle: String,
    /// Canonical vendor name to record.
    pub canonical: String,
}

impl KnownVendor {
    pub fn new(needle: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            canonical: canonical.into(),
        }
    }
}

/// User-supplied extraction pattern for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub field: FieldKey,
    /// Regular expression; the first capture group (or the whole match) is the value.
    pub pattern: String,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Text written in place of absent values.
    pub absent_marker: String,

    /// Emit records in input listing order rather than completion order.
    pub preserve_order: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            absent_marker: "NaN".to_string(),
            preserve_order: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.triage.min_score) {
            return Err(InvoscanError::Config(format!(
                "triage.min_score must be between 0 and 1, got {}",
                self.triage.min_score
            )));
        }
        if self.extraction.min_digit_run == 0 {
            return Err(InvoscanError::Config(
                "extraction.min_digit_run must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
