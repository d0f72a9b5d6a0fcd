//! Rule tables and value normalization shared by all extractors.

pub mod dates;
pub mod normalizer;
pub mod patterns;

pub use dates::parse_invoice_date;
pub use normalizer::{format_amount, normalize_amount, normalize_identifier};
pub use patterns::{
    FieldPattern, PatternCatalog, PatternKind, PatternMatch, PatternRule, PostProcess,
    currency_code,
};
