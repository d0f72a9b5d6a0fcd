//! Reliability scoring and triage.

use serde::{Deserialize, Serialize};

use crate::models::record::{FieldKey, FieldSet, TriageState};

/// Thresholds deciding when a generic extraction needs manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriagePolicy {
    /// Records scoring below this need review.
    pub min_score: f64,

    /// Records with at least this many absent fields need review.
    pub absent_limit: usize,
}

impl Default for TriagePolicy {
    fn default() -> Self {
        Self {
            min_score: 0.6,
            absent_limit: 2,
        }
    }
}

/// Fraction of fields present, rounded to two decimals.
pub fn score(fields: &FieldSet) -> f64 {
    let ratio = fields.present_count() as f64 / FieldKey::ALL.len() as f64;
    (ratio * 100.0).round() / 100.0
}

/// Score a field set and decide its triage state.
pub fn triage(fields: &FieldSet, policy: &TriagePolicy) -> (f64, TriageState) {
    let score = score(fields);
    let state = if score < policy.min_score || fields.absent_count() >= policy.absent_limit {
        TriageState::NeedsReview
    } else {
        TriageState::Ok
    };
    (score, state)
}
