//! Plot suitability, equity and conflict evaluation feeding a greedy allocator.
//!
//! Providers supply plot data per evaluation; the engine scores every
//! (plot, application) pair, and the optimizer commits the best-scoring approvable
//! pairs with one plot per applicant and one applicant per plot.

pub mod domain;
pub mod evaluation;
pub(crate) mod intake;
pub mod ledger;
pub mod optimizer;
pub mod providers;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Allocation, Applicant, Application, ApplicationId, EnvironmentalFactors, Gender, Geometry,
    IncomeLevel, LandUse, Plot, PlotAttributes, PlotId, PlotSnapshot, RunId,
};
pub use evaluation::{
    combined_score, score_equity, score_suitability, CommunityImpactRule, Conflict,
    ConflictDetector, ConflictKind, ConflictReport, EquityBreakdown, Evaluation,
    EvaluationConfig, EvaluationEngine, EvaluationError, NeutralCommunityImpact,
    Recommendation, ReviewReason, ScoreComponent, ScoreFactor, SuitabilityBreakdown,
    APPROVAL_THRESHOLD,
};
pub use intake::{DemographicField, InvalidInput};
pub use ledger::{
    AllocatedPairView, AllocationLedger, AllocationNotice, AllocationNotifier,
    AllocationRunRecord, AllocationRunSummary, LedgerError, NoticeError,
};
pub use optimizer::{AllocationError, AllocationOptimizer, AllocationOutcome, ExcludedPair};
pub use providers::{
    ConflictDetail, EnvironmentalDataProvider, MemoizedEnvironmentalProvider, ProviderError,
    SpatialDataProvider,
};
pub use router::{allocation_router, EvaluateRequest};
pub use service::{AllocationRequest, AllocationService, AllocationServiceError};
