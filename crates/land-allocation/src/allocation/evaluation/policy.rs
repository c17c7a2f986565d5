use serde::{Deserialize, Serialize};

use super::conflicts::ConflictReport;
use super::round_score;

/// Minimum suitability for an unconflicted pairing to be approved.
pub const APPROVAL_THRESHOLD: f64 = 70.0;
pub const SUITABILITY_WEIGHT: f64 = 0.7;
pub const EQUITY_WEIGHT: f64 = 0.3;

/// Outcome of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Review { reasons: Vec<ReviewReason> },
}

impl Recommendation {
    pub fn is_approve(&self) -> bool {
        matches!(self, Recommendation::Approve)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Approve => "approve",
            Recommendation::Review { .. } => "review",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Recommendation::Approve => "approve for allocation".to_string(),
            Recommendation::Review { reasons } => {
                let reasons: Vec<String> = reasons.iter().map(ReviewReason::summary).collect();
                format!("review required: {}", reasons.join("; "))
            }
        }
    }
}

/// Why a pairing was held back for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewReason {
    LowSuitability { score: f64, threshold: f64 },
    UnresolvedConflicts { count: usize },
}

impl ReviewReason {
    pub fn summary(&self) -> String {
        match self {
            ReviewReason::LowSuitability { score, threshold } => {
                format!("suitability {:.2} below {:.2}", score, threshold)
            }
            ReviewReason::UnresolvedConflicts { count } => {
                format!("{count} unresolved conflict(s)")
            }
        }
    }
}

pub fn combined_score(suitability: f64, equity: f64) -> f64 {
    round_score(SUITABILITY_WEIGHT * suitability + EQUITY_WEIGHT * equity)
}

pub(crate) fn decide_recommendation(suitability: f64, conflicts: &ConflictReport) -> Recommendation {
    let mut reasons = Vec::new();

    if suitability < APPROVAL_THRESHOLD {
        reasons.push(ReviewReason::LowSuitability {
            score: suitability,
            threshold: APPROVAL_THRESHOLD,
        });
    }

    if !conflicts.is_clear() {
        reasons.push(ReviewReason::UnresolvedConflicts {
            count: conflicts.blocking.len(),
        });
    }

    if reasons.is_empty() {
        Recommendation::Approve
    } else {
        Recommendation::Review { reasons }
    }
}
