use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, PlotId, RunId};
use super::optimizer::AllocationOutcome;

/// Ledger entry for a completed optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRunRecord {
    pub run_id: RunId,
    pub requested_at: DateTime<Utc>,
    pub outcome: AllocationOutcome,
}

impl AllocationRunRecord {
    pub fn summary_view(&self) -> AllocationRunSummary {
        AllocationRunSummary {
            run_id: self.run_id.clone(),
            requested_at: self.requested_at,
            evaluated_pairs: self.outcome.evaluated_pairs,
            excluded_pairs: self.outcome.excluded_pairs.len(),
            allocations: self
                .outcome
                .allocations
                .iter()
                .map(|allocation| AllocatedPairView {
                    plot_id: allocation.plot.id.clone(),
                    application_id: allocation.application.id.clone(),
                    combined_score: allocation.combined_score,
                })
                .collect(),
            unallocated_applications: self
                .outcome
                .unallocated_applications
                .iter()
                .map(|application| application.id.clone())
                .collect(),
        }
    }
}

/// Storage abstraction for run records; callers decide where runs live.
pub trait AllocationLedger: Send + Sync {
    fn record(&self, record: AllocationRunRecord) -> Result<AllocationRunRecord, LedgerError>;
    fn fetch(&self, id: &RunId) -> Result<Option<AllocationRunRecord>, LedgerError>;
    fn recent(&self, limit: usize) -> Result<Vec<AllocationRunRecord>, LedgerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("run already recorded")]
    Conflict,
    #[error("run not found")]
    NotFound,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook telling applicants about allocations (SMS, e-mail, registry adapters).
pub trait AllocationNotifier: Send + Sync {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationNotice {
    pub template: String,
    pub run_id: RunId,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Compact view of a run for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRunSummary {
    pub run_id: RunId,
    pub requested_at: DateTime<Utc>,
    pub evaluated_pairs: usize,
    pub excluded_pairs: usize,
    pub allocations: Vec<AllocatedPairView>,
    pub unallocated_applications: Vec<ApplicationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocatedPairView {
    pub plot_id: PlotId,
    pub application_id: ApplicationId,
    pub combined_score: f64,
}
