//! Multilingual pattern catalog for invoice field extraction.
//!
//! Built-in tables are compiled once per process. A [`PatternCatalog`] is an
//! immutable snapshot of those tables, optionally extended with configured
//! patterns, that callers pass to the extractors explicitly.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::{InvoscanError, Result};
use crate::models::config::CustomPattern;
use crate::models::record::{FieldKey, FieldValue};

use super::normalizer::{normalize_amount, normalize_identifier};

/// Priority tag of a pattern. Within a field, patterns run in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Anchored on a field label ("Total factura:", "Rechnungsnummer").
    Labeled,
    /// Anchored on a vocabulary word (product names, currency codes).
    Keyword,
    /// Generic value shape (dates, decimal numbers).
    Shape,
}

/// A number as printed on an invoice, ending on a digit.
///
/// Thousands may be grouped with spaces (`1 234,56`, also NBSP and narrow
/// NBSP); otherwise digits and `.`/`,` separators only.
pub const AMOUNT_NUMBER: &str =
    r"[\-\x{2212}]?(?:\d{1,3}(?:[ \x{a0}\x{202f}]\d{3}\b)+(?:[.,]\d+)?|\d(?:[\d.,]*\d)?)";

/// Amount capture shared by the labeled total patterns: optional currency, then the number.
/// Anything number-like that is not a clean amount is still captured so the
/// field's fallbacks can take over.
fn labeled_amount() -> String {
    format!(
        r"[:\s€$£]*(?:(?:EUR|USD|GBP|PLN|SEK|CHF)\s*)?({}|[\-\x{{2212}}\d.,]+)",
        AMOUNT_NUMBER
    )
}

/// Invoice identifier capture: must contain at least one digit.
const IDENTIFIER: &str = r"([\w\-/]*\d[\w\-/]*)";

/// Numeric date capture (`15.01.2024`, `15/01/24`).
const NUMERIC_DATE: &str = r"(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})";

fn compile(specs: Vec<(PatternKind, String)>) -> Vec<FieldPattern> {
    specs
        .into_iter()
        .map(|(kind, pattern)| FieldPattern {
            regex: Regex::new(&pattern).unwrap(),
            kind,
        })
        .collect()
}

fn labeled(label: &str, capture: &str) -> (PatternKind, String) {
    (PatternKind::Labeled, format!(r"(?i)\b{}{}", label, capture))
}

fn amount_label(label: &str) -> (PatternKind, String) {
    labeled(label, &labeled_amount())
}

fn line_label(label: &str) -> (PatternKind, String) {
    labeled(label, r"[:\s]*(.+)")
}

fn id_label(label: &str) -> (PatternKind, String) {
    labeled(label, &format!(r"[:\s]*{}", IDENTIFIER))
}

lazy_static! {
    /// Decimal-shaped number with two decimals: `1.234,56`, `1234.56`, `-12,00`.
    ///
    /// Group 1 is the number. The trailing alternation keeps date fragments
    /// such as `15.01` in `15.01.2024` from matching.
    pub static ref AMOUNT_SHAPE: Regex = Regex::new(
        r"([\-\x{2212}]?\b(?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]\d{2})(?:$|[^\d.,]|[.,](?:$|[^\d]))"
    ).unwrap();

    /// Keywords marking a line that carries a total.
    pub static ref TOTAL_KEYWORD: Regex = Regex::new(
        r"(?i)total|importe|amount\s+due|totaal|montant|gesamt"
    ).unwrap();

    /// Any numeric-looking token, ending on a digit.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(AMOUNT_NUMBER).unwrap();

    static ref DATE_PATTERNS: Vec<FieldPattern> = compile(vec![
        labeled(r"Fecha\s+de\s+(?:la\s+)?factura", &format!(r"[:\s]*{}", NUMERIC_DATE)),
        labeled(
            r"(?:Invoice|Issue)\s+date",
            r"[:\s]*(\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4}|\p{L}+\s\d{1,2},\s\d{4}|\d{1,2}\s+\p{L}+\s+\d{4})",
        ),
        labeled(r"Date\s+(?:de\s+(?:la\s+)?facture|d'émission)", &format!(r"[:\s]*{}", NUMERIC_DATE)),
        labeled(r"(?:Rechnungsdatum|Factuurdatum|Fakturadatum)", &format!(r"[:\s]*{}", NUMERIC_DATE)),
        (PatternKind::Shape, r"(\d{2}[/\-]\d{2}[/\-]\d{4})".to_string()),
        (PatternKind::Shape, r"(\d{2}[.\-]\d{2}[.\-]\d{2,4})".to_string()),
        (PatternKind::Shape, r"(?i)(\d{1,2}\s+(?:de\s+)?\p{L}+\s+\d{4})".to_string()),
        (PatternKind::Shape, r"(\p{L}+\s\d{1,2},\s\d{4})".to_string()),
    ]);

    static ref VENDOR_PATTERNS: Vec<FieldPattern> = compile(vec![
        line_label(r"Vendido\s+por"),
        line_label(r"Sold\s+by"),
        line_label(r"Verkauft\s+von"),
        line_label(r"Nombre\s+del\s+proveedor"),
        line_label(r"Proveedor\b"),
        line_label(r"Nom\s+du\s+fournisseur"),
        line_label(r"Client\b"),
        line_label(r"Bill(?:ed)?\s+to\b"),
        line_label(r"Dienstverlener\b"),
        line_label(r"Zakelijk\s+adres\b"),
        line_label(r"Leverant[öo]r\b"),
        line_label(r"F[öo]retagsnamn\b"),
    ]);

    static ref TOTAL_PATTERNS: Vec<FieldPattern> = compile(vec![
        amount_label(r"Total\s+factura"),
        amount_label(r"Amount\s+Due"),
        amount_label(r"Total"),
        amount_label(r"Importe\s+Total"),
        amount_label(r"Total\s+Due"),
        amount_label(r"Grand\s+Total"),
        amount_label(r"VAT\s+Total"),
        amount_label(r"Amount\s+Paid"),
        amount_label(r"Totaal"),
        amount_label(r"Montant\s+total"),
        amount_label(r"Gesamtbetrag"),
        amount_label(r"Att\s+betala"),
        (PatternKind::Shape, AMOUNT_SHAPE.as_str().to_string()),
    ]);

    static ref CURRENCY_PATTERNS: Vec<FieldPattern> = compile(vec![
        labeled(r"(?:Currency|Moneda|Divisa|Devise|W[äa]hrung|Valuta)", r"[:\s]*([A-Z]{3})\b"),
        (PatternKind::Keyword, r"\b(EUR|USD|GBP|PLN|SEK|CHF|NOK|DKK)\b".to_string()),
        (PatternKind::Shape, r"(€|\$|£|zł)".to_string()),
    ]);

    static ref PRODUCT_PATTERNS: Vec<FieldPattern> = compile(vec![
        labeled(r"(?:Producto|Product|Artículo|Article|Artikel)", r"[ \t]*:[ \t]*(.+)"),
        (
            PatternKind::Keyword,
            r"(?i)((?:ALTAVOZ|CASCO|AURICULARES|PIZARRA|BUFFET|COCACOLA|DETOX|CHAMP[ÚU]|SUSHI|ZAPATILLA|CAMISETA|LÁMPARA).*)"
                .to_string(),
        ),
    ]);

    static ref DESCRIPTION_PATTERNS: Vec<FieldPattern> = compile(vec![
        line_label(r"(?:Descripci[óo]n|Description)\b"),
        line_label(r"Motif\b"),
        line_label(r"Item\b"),
        (PatternKind::Keyword, r"(?i)(Remboursement frais)".to_string()),
        line_label(r"Omschrijving\b"),
        (
            PatternKind::Keyword,
            r"(?i)((?:Comisión|Detox|Auriculares|Sushi|Capsulas)[^\n]*)".to_string(),
        ),
    ]);

    static ref INVOICE_NUMBER_PATTERNS: Vec<FieldPattern> = compile(vec![
        id_label(r"N[úu]mero\s+de\s+(?:la\s+)?factura"),
        labeled(r"Factura", &format!(r"[\s\-:]*[Nnº]*[:\s]*{}", IDENTIFIER)),
        labeled(r"Invoice", &format!(r"\s*(?:No\.?|number|#)?[:\s]*{}", IDENTIFIER)),
        id_label(r"N[úu]mero\s+nota\s+de\s+cr[ée]dito"),
        id_label(r"Num[ée]ro\s+de\s+note\s+de\s+cr[ée]dit"),
        id_label(r"Num[ée]ro\s+de\s+(?:la\s+)?facture"),
        id_label(r"Factuurnummer"),
        (PatternKind::Labeled, format!(r"(?i)Nº[:\s]*{}", IDENTIFIER)),
        id_label(r"Reference"),
        (PatternKind::Labeled, format!(r"(?i)\bRef\.?[:\s]*{}", IDENTIFIER)),
        id_label(r"Rechnungsnummer"),
        id_label(r"Fakturanummer"),
    ]);
}

/// A compiled extraction pattern with its priority tag.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    pub regex: Regex,
    pub kind: PatternKind,
}

impl FieldPattern {
    /// First capture group of the first match, or the whole match when the
    /// pattern has no group.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.regex.captures(text)?;
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }
}

/// Conversion applied to the raw capture before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    /// Keep the text, trimmed.
    Trim,
    /// Normalize to a decimal amount.
    Amount,
    /// Clean an invoice identifier.
    Identifier,
    /// Map a code or symbol to an ISO 4217 code.
    CurrencyCode,
}

impl PostProcess {
    pub fn apply(&self, raw: &str) -> FieldValue {
        match self {
            PostProcess::Trim => FieldValue::text(raw.trim()),
            PostProcess::Amount => normalize_amount(raw).into(),
            PostProcess::Identifier => normalize_identifier(raw).into(),
            PostProcess::CurrencyCode => currency_code(raw).into(),
        }
    }
}

/// Map a currency symbol or code to its ISO 4217 code.
pub fn currency_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let code = match raw {
        "€" => "EUR",
        "$" => "USD",
        "£" => "GBP",
        _ if raw.replace(' ', "").eq_ignore_ascii_case("US$") => "USD",
        _ if raw.eq_ignore_ascii_case("zł") || raw.eq_ignore_ascii_case("zl") => "PLN",
        _ if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) => {
            return Some(raw.to_ascii_uppercase());
        }
        _ => return None,
    };
    Some(code.to_string())
}

/// A raw pattern hit: which pattern matched and what it captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    pub index: usize,
    pub kind: PatternKind,
    pub raw: &'t str,
}

/// Ordered patterns for one field plus their post-processing.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub field: FieldKey,
    pub patterns: Vec<FieldPattern>,
    pub post: PostProcess,
}

impl PatternRule {
    /// Try patterns in order; the first one that matches wins.
    pub fn match_first<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        self.patterns.iter().enumerate().find_map(|(index, pattern)| {
            pattern.capture(text).map(|raw| PatternMatch {
                index,
                kind: pattern.kind,
                raw,
            })
        })
    }

    /// Primary pass for this field: first match, post-processed.
    pub fn apply(&self, text: &str) -> FieldValue {
        match self.match_first(text) {
            Some(hit) => {
                let value = self.post.apply(hit.raw);
                trace!(
                    field = %self.field,
                    pattern = hit.index,
                    kind = ?hit.kind,
                    raw = hit.raw,
                    present = value.is_present(),
                    "pattern matched"
                );
                value
            }
            None => FieldValue::Absent,
        }
    }
}

/// Immutable per-field pattern tables.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<PatternRule>,
}

impl PatternCatalog {
    /// Catalog with only the built-in patterns.
    pub fn builtin() -> Self {
        let rules = FieldKey::ALL
            .into_iter()
            .map(|field| {
                let (patterns, post): (&Vec<FieldPattern>, PostProcess) = match field {
                    FieldKey::Date => (&*DATE_PATTERNS, PostProcess::Trim),
                    FieldKey::Vendor => (&*VENDOR_PATTERNS, PostProcess::Trim),
                    FieldKey::TotalAmount => (&*TOTAL_PATTERNS, PostProcess::Amount),
                    FieldKey::Currency => (&*CURRENCY_PATTERNS, PostProcess::CurrencyCode),
                    FieldKey::Product => (&*PRODUCT_PATTERNS, PostProcess::Trim),
                    FieldKey::Description => (&*DESCRIPTION_PATTERNS, PostProcess::Trim),
                    FieldKey::InvoiceNumber => (&*INVOICE_NUMBER_PATTERNS, PostProcess::Identifier),
                };
                PatternRule {
                    field,
                    patterns: patterns.clone(),
                    post,
                }
            })
            .collect();

        Self { rules }
    }

    /// Built-in catalog with `custom` patterns tried first for their fields,
    /// in the order given.
    pub fn with_custom(custom: &[CustomPattern]) -> Result<Self> {
        let mut catalog = Self::builtin();

        for rule in &mut catalog.rules {
            let extra = custom
                .iter()
                .filter(|c| c.field == rule.field)
                .map(|c| {
                    Regex::new(&c.pattern)
                        .map(|regex| FieldPattern {
                            regex,
                            kind: PatternKind::Labeled,
                        })
                        .map_err(|source| InvoscanError::Pattern {
                            field: c.field,
                            pattern: c.pattern.clone(),
                            source,
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut patterns = extra;
            patterns.append(&mut rule.patterns);
            rule.patterns = patterns;
        }

        Ok(catalog)
    }

    pub fn rule(&self, field: FieldKey) -> &PatternRule {
        // Rules are built in FieldKey::ALL order.
        &self.rules[field as usize]
    }

    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter()
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
