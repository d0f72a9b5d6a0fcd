//! Error types for the invoscan-core library.
//!
//! Field extraction itself never fails: a value that cannot be parsed or a
//! field no pattern matches is recorded as [`FieldValue::Absent`](crate::FieldValue).
//! The errors here cover building a scanner from configuration.

use thiserror::Error;

use crate::models::record::FieldKey;

/// Main error type for the invoscan library.
#[derive(Error, Debug)]
pub enum InvoscanError {
    /// A configured extraction pattern is not a valid regular expression.
    #[error("invalid pattern for {field}: {pattern}: {source}")]
    Pattern {
        field: FieldKey,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the invoscan library.
pub type Result<T> = std::result::Result<T, InvoscanError>;
