use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::domain::{Application, PlotId};
use super::super::providers::{bounded, ConflictDetail, ProviderError, SpatialDataProvider};

/// Register a conflict was reported by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Boundary,
    HistoricalClaim,
    CustomaryRights,
}

/// Conflict detail tagged with its register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    #[serde(flatten)]
    pub detail: ConflictDetail,
}

/// Conflicts found for a pairing.
///
/// `blocking` entries force a review. `acknowledged` holds customary-rights claims the
/// applicant has accepted; they do not block, but they are still reported so an empty
/// `blocking` list never reads as "no customary claims exist".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictReport {
    pub blocking: Vec<Conflict>,
    pub acknowledged: Vec<Conflict>,
}

impl ConflictReport {
    pub fn is_clear(&self) -> bool {
        self.blocking.is_empty()
    }

    pub fn has_customary_claims(&self) -> bool {
        self.blocking
            .iter()
            .chain(self.acknowledged.iter())
            .any(|conflict| conflict.kind == ConflictKind::CustomaryRights)
    }

    pub fn count_of(&self, kind: ConflictKind) -> usize {
        self.blocking
            .iter()
            .filter(|conflict| conflict.kind == kind)
            .count()
    }
}

/// Aggregates the three spatial conflict registers for a plot.
pub struct ConflictDetector<S> {
    spatial: Arc<S>,
    timeout: Duration,
}

impl<S> ConflictDetector<S>
where
    S: SpatialDataProvider,
{
    pub fn new(spatial: Arc<S>, timeout: Duration) -> Self {
        Self { spatial, timeout }
    }

    /// Queries every register concurrently. Any failing register fails the detection.
    pub async fn detect(
        &self,
        plot_id: &PlotId,
        application: &Application,
    ) -> Result<ConflictReport, ProviderError> {
        let (boundary, historical, customary) = tokio::try_join!(
            bounded(
                "boundary_disputes",
                self.timeout,
                self.spatial.boundary_disputes(plot_id)
            ),
            bounded(
                "competing_claims",
                self.timeout,
                self.spatial.competing_claims(plot_id)
            ),
            bounded(
                "customary_rights",
                self.timeout,
                self.spatial.customary_rights(plot_id)
            ),
        )?;

        let tag = |kind: ConflictKind, details: Vec<ConflictDetail>| {
            details
                .into_iter()
                .map(move |detail| Conflict { kind, detail })
        };

        let mut report = ConflictReport::default();
        report
            .blocking
            .extend(tag(ConflictKind::Boundary, boundary));
        report
            .blocking
            .extend(tag(ConflictKind::HistoricalClaim, historical));

        let customary = tag(ConflictKind::CustomaryRights, customary);
        if application.acknowledges_customary_rights {
            report.acknowledged.extend(customary);
        } else {
            report.blocking.extend(customary);
        }

        debug!(
            plot = %plot_id,
            application = %application.id,
            blocking = report.blocking.len(),
            acknowledged = report.acknowledged.len(),
            "conflict registers checked"
        );

        Ok(report)
    }
}
