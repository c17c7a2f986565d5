mod config;
mod conflicts;
mod equity;
mod policy;
mod suitability;

pub use config::EvaluationConfig;
pub use conflicts::{Conflict, ConflictDetector, ConflictKind, ConflictReport};
pub use equity::{score_equity, EquityBreakdown};
pub use policy::{
    combined_score, Recommendation, ReviewReason, APPROVAL_THRESHOLD, EQUITY_WEIGHT,
    SUITABILITY_WEIGHT,
};
pub use suitability::{
    score_suitability, CommunityImpactRule, NeutralCommunityImpact, SuitabilityBreakdown,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{Application, ApplicationId, Plot, PlotId, PlotSnapshot};
use super::intake::{check_application, check_snapshot, InvalidInput};
use super::providers::{bounded, EnvironmentalDataProvider, ProviderError, SpatialDataProvider};
use policy::decide_recommendation;

/// Evaluates (plot, application) pairs against the suitability and equity rubrics.
///
/// Holds no mutable state; two evaluations of the same pair against deterministic
/// providers produce the same scores.
pub struct EvaluationEngine<E, S> {
    environmental: Arc<E>,
    spatial: Arc<S>,
    conflicts: ConflictDetector<S>,
    community: Arc<dyn CommunityImpactRule>,
    config: EvaluationConfig,
}

impl<E, S> EvaluationEngine<E, S>
where
    E: EnvironmentalDataProvider,
    S: SpatialDataProvider,
{
    pub fn new(environmental: Arc<E>, spatial: Arc<S>, config: EvaluationConfig) -> Self {
        Self::with_community_rule(environmental, spatial, Arc::new(NeutralCommunityImpact), config)
    }

    pub fn with_community_rule(
        environmental: Arc<E>,
        spatial: Arc<S>,
        community: Arc<dyn CommunityImpactRule>,
        config: EvaluationConfig,
    ) -> Self {
        let conflicts = ConflictDetector::new(spatial.clone(), config.provider_timeout());
        Self {
            environmental,
            spatial,
            conflicts,
            community,
            config,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Fetch fresh provider data for the pair and score it.
    ///
    /// Application fields are checked before any provider is contacted. Environmental,
    /// attribute and conflict lookups then run concurrently under the provider timeout.
    pub async fn evaluate_plot_suitability(
        &self,
        plot: &Plot,
        application: &Application,
    ) -> Result<Evaluation, EvaluationError> {
        check_application(application)?;

        let timeout = self.config.provider_timeout();
        let (environment, attributes, conflicts) = tokio::try_join!(
            bounded(
                "environmental_factors",
                timeout,
                self.environmental.environmental_factors(&plot.id)
            ),
            bounded(
                "plot_attributes",
                timeout,
                self.spatial.plot_attributes(&plot.id)
            ),
            self.conflicts.detect(&plot.id, application),
        )?;

        let snapshot = PlotSnapshot {
            id: plot.id.clone(),
            label: plot.label.clone(),
            attributes,
            environment,
        };
        check_snapshot(&snapshot)?;

        let suitability = score_suitability(&snapshot, application, self.community.as_ref());
        let equity = score_equity(&application.applicant);
        let combined = combined_score(suitability.score, equity.score);
        let recommendation = decide_recommendation(suitability.score, &conflicts);

        debug!(
            plot = %snapshot.id,
            application = %application.id,
            suitability = suitability.score,
            equity = equity.score,
            combined,
            recommendation = recommendation.label(),
            "pair evaluated"
        );

        Ok(Evaluation {
            plot: snapshot,
            application_id: application.id.clone(),
            suitability,
            equity,
            combined_score: combined,
            conflicts,
            recommendation,
            evaluated_at: Utc::now(),
        })
    }
}

/// Factors that contribute points to a suitability or equity total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Environmental,
    Infrastructure,
    Zoning,
    CommunityImpact,
    FemaleApplicant,
    LowIncome,
    NonTribalApplicant,
    Disability,
    Youth,
}

/// Discrete contribution to a score, kept for audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: f64,
    pub notes: String,
}

/// Scored pairing. Built once per optimization run and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub plot: PlotSnapshot,
    pub application_id: ApplicationId,
    pub suitability: SuitabilityBreakdown,
    pub equity: EquityBreakdown,
    pub combined_score: f64,
    pub conflicts: ConflictReport,
    pub recommendation: Recommendation,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn plot_id(&self) -> &PlotId {
        &self.plot.id
    }

    pub fn suitability_score(&self) -> f64 {
        self.suitability.score
    }

    pub fn equity_score(&self) -> f64 {
        self.equity.score
    }
}

/// Failure to evaluate a single pair.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Rounds to two decimals so float noise never leaks into thresholds or reports.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamps a total into `[0, 100]`; non-finite totals score zero.
pub(crate) fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    round_score(value.clamp(0.0, 100.0))
}
