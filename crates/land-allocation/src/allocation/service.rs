use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{Application, Plot, RunId};
use super::evaluation::{Evaluation, EvaluationConfig, EvaluationEngine, EvaluationError};
use super::ledger::{
    AllocationLedger, AllocationNotice, AllocationNotifier, AllocationRunRecord, LedgerError,
    NoticeError,
};
use super::optimizer::{AllocationError, AllocationOptimizer};
use super::providers::{EnvironmentalDataProvider, SpatialDataProvider};

/// Inbound payload for an optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub applications: Vec<Application>,
    pub plots: Vec<Plot>,
}

/// Service composing the optimizer with the run ledger and applicant notices.
pub struct AllocationService<E, S, L, N> {
    optimizer: Arc<AllocationOptimizer<E, S>>,
    ledger: Arc<L>,
    notifier: Arc<N>,
}

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> RunId {
    let id = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RunId(format!("run-{id:06}"))
}

impl<E, S, L, N> AllocationService<E, S, L, N>
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    pub fn new(
        environmental: Arc<E>,
        spatial: Arc<S>,
        ledger: Arc<L>,
        notifier: Arc<N>,
        config: EvaluationConfig,
    ) -> Self {
        let engine = EvaluationEngine::new(environmental, spatial, config);
        Self::with_engine(engine, ledger, notifier)
    }

    pub fn with_engine(engine: EvaluationEngine<E, S>, ledger: Arc<L>, notifier: Arc<N>) -> Self {
        Self {
            optimizer: Arc::new(AllocationOptimizer::new(Arc::new(engine))),
            ledger,
            notifier,
        }
    }

    /// Optimize the request, record the run, and notify every allocated applicant.
    pub async fn run(
        &self,
        request: AllocationRequest,
    ) -> Result<AllocationRunRecord, AllocationServiceError> {
        let run_id = next_run_id();
        let requested_at = Utc::now();
        let outcome = self
            .optimizer
            .optimize(&request.applications, &request.plots)
            .await?;

        let record = self.ledger.record(AllocationRunRecord {
            run_id,
            requested_at,
            outcome,
        })?;

        for allocation in &record.outcome.allocations {
            let mut details = BTreeMap::new();
            details.insert("plot_id".to_string(), allocation.plot.id.0.clone());
            details.insert(
                "combined_score".to_string(),
                format!("{:.2}", allocation.combined_score),
            );
            self.notifier.publish(AllocationNotice {
                template: "plot_allocated".to_string(),
                run_id: record.run_id.clone(),
                application_id: allocation.application.id.clone(),
                details,
            })?;
        }

        Ok(record)
    }

    /// Score a single pair without allocating anything.
    pub async fn evaluate(
        &self,
        plot: &Plot,
        application: &Application,
    ) -> Result<Evaluation, EvaluationError> {
        self.optimizer
            .engine()
            .evaluate_plot_suitability(plot, application)
            .await
    }

    pub fn get(&self, run_id: &RunId) -> Result<AllocationRunRecord, AllocationServiceError> {
        let record = self.ledger.fetch(run_id)?.ok_or(LedgerError::NotFound)?;
        Ok(record)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<AllocationRunRecord>, AllocationServiceError> {
        Ok(self.ledger.recent(limit)?)
    }
}

/// Error raised by the allocation service.
#[derive(Debug, thiserror::Error)]
pub enum AllocationServiceError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Notice(#[from] NoticeError),
}
