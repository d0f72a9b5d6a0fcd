//! Vendor classification and vendor-specific extractors.
//!
//! A vendor profile recognizes one known invoice layout by its signature
//! text and extracts fields with patterns tuned to that layout. Profiles are
//! consulted in [`VendorId::PRIORITY`] order; the first whose signature
//! matches handles the document and no other profile is tried.

mod alibaba;
mod amazon;
mod openai;

pub use alibaba::AlibabaProfile;
pub use amazon::AmazonProfile;
pub use openai::OpenAiProfile;

use std::fmt;

use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::record::{FieldKey, FieldSet, FieldValue, VendorId};

use super::rules::normalizer::normalize_amount;
use super::rules::patterns::{AMOUNT_NUMBER, PatternCatalog, currency_code};

/// Horizontal gap between a currency tag and its amount. Never a line break.
const GAP: &str = r"[ \t\x{a0}\x{202f}]*";

/// A known invoice layout with a dedicated extractor.
pub trait VendorProfile: Send + Sync {
    /// Which vendor this profile handles.
    fn id(&self) -> VendorId;

    /// Whether `text` carries this vendor's signature.
    fn matches(&self, text: &str) -> bool;

    /// Extract all fields. Fields the layout lacks are absent; the generic
    /// extractor is never consulted as a fallback.
    fn extract(&self, text: &str, catalog: &PatternCatalog) -> FieldSet;
}

/// Ordered set of vendor profiles.
pub struct VendorRegistry {
    profiles: Vec<Box<dyn VendorProfile>>,
}

impl VendorRegistry {
    /// All built-in profiles in classification priority order.
    pub fn builtin() -> Self {
        let profiles = VendorId::PRIORITY
            .into_iter()
            .map(|id| -> Box<dyn VendorProfile> {
                match id {
                    VendorId::Amazon => Box::new(AmazonProfile),
                    VendorId::OpenAi => Box::new(OpenAiProfile),
                    VendorId::Alibaba => Box::new(AlibabaProfile),
                }
            })
            .collect();

        Self { profiles }
    }

    /// Registry that classifies nothing.
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Vendor whose signature matches first, if any.
    pub fn classify(&self, text: &str) -> Option<VendorId> {
        self.profile(text).map(|p| p.id())
    }

    /// Profile that handles `text`, if any.
    pub fn profile(&self, text: &str) -> Option<&dyn VendorProfile> {
        let profile = self.profiles.iter().find(|p| p.matches(text))?;
        debug!(vendor = %profile.id(), "vendor signature matched");
        Some(profile.as_ref())
    }

    /// Registered vendors, in priority order.
    pub fn ids(&self) -> Vec<VendorId> {
        self.profiles.iter().map(|p| p.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for VendorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorRegistry")
            .field("profiles", &self.ids())
            .finish()
    }
}

/// First capture of the first matching pattern.
fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    })
}

/// Currency tag followed by its amount on the same line.
fn currency_before(currency: &str) -> Regex {
    Regex::new(&format!(r"(?P<currency>{}){}(?P<amount>{})", currency, GAP, AMOUNT_NUMBER)).unwrap()
}

/// Amount followed by its currency tag on the same line.
fn currency_after(currency: &str) -> Regex {
    Regex::new(&format!(r"(?P<amount>{}){}(?P<currency>{})", AMOUNT_NUMBER, GAP, currency)).unwrap()
}

/// The amount occurring last in the text among all currency-tagged matches.
///
/// Patterns must define `amount` and `currency` named groups. Matches whose
/// amount does not normalize are skipped.
fn last_tagged_amount(patterns: &[Regex], text: &str) -> Option<(Decimal, Option<String>)> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| {
            let amount = caps.name("amount")?;
            let value = normalize_amount(amount.as_str())?;
            let currency = caps.name("currency").and_then(|c| currency_code(c.as_str()));
            Some((amount.start(), value, currency))
        })
        .max_by_key(|(start, _, _)| *start)
        .map(|(_, value, currency)| (value, currency))
}

/// Total and currency fields from the last tagged amount; both absent when none.
fn total_fields(patterns: &[Regex], text: &str) -> (FieldValue, FieldValue) {
    match last_tagged_amount(patterns, text) {
        Some((amount, currency)) => (FieldValue::Amount(amount), currency.into()),
        None => (FieldValue::Absent, FieldValue::Absent),
    }
}

/// First non-empty line after the first line matching `header`.
fn line_after<'t>(text: &'t str, header: &Regex) -> Option<&'t str> {
    text.lines()
        .skip_while(|line| !header.is_match(line))
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty())
}

/// Labeled value from the vendor's own patterns, else the shared catalog.
fn text_field(patterns: &[Regex], text: &str, catalog: &PatternCatalog, field: FieldKey) -> FieldValue {
    match first_capture(patterns, text) {
        Some(raw) => FieldValue::text(raw.trim()),
        None => catalog.rule(field).apply(text),
    }
}
