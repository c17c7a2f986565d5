//! Greedy allocation over the full plot × application cross product.
//!
//! Every pair is evaluated before anything is committed, then pairs are walked once in
//! descending combined score. This is greedy by global score, not a stable matching: a
//! plot can go to a mediocre pairing that sorts above a better alternative for the same
//! plot with a different applicant.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::domain::{Allocation, Application, ApplicationId, Plot, PlotId};
use super::evaluation::{Evaluation, EvaluationEngine, EvaluationError};
use super::intake::InvalidInput;
use super::providers::{EnvironmentalDataProvider, ProviderError, SpatialDataProvider};

/// Result of one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub allocations: Vec<Allocation>,
    pub unallocated_applications: Vec<Application>,
    pub excluded_pairs: Vec<ExcludedPair>,
    pub evaluated_pairs: usize,
}

impl AllocationOutcome {
    fn nothing_allocated(applications: &[Application]) -> Self {
        Self {
            allocations: Vec::new(),
            unallocated_applications: applications.to_vec(),
            excluded_pairs: Vec::new(),
            evaluated_pairs: 0,
        }
    }
}

/// Pair skipped because its inputs could not be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedPair {
    pub plot_id: PlotId,
    pub application_id: ApplicationId,
    pub reason: InvalidInput,
}

/// Run-level failure. A provider outage aborts the run since no partial evaluation set
/// can support the global sort.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("provider failure evaluating plot {plot_id} for application {application_id}: {source}")]
    Provider {
        plot_id: PlotId,
        application_id: ApplicationId,
        #[source]
        source: ProviderError,
    },
}

enum PairOutcome {
    Scored(usize, Evaluation),
    Excluded(ExcludedPair),
}

pub struct AllocationOptimizer<E, S> {
    engine: Arc<EvaluationEngine<E, S>>,
}

impl<E, S> AllocationOptimizer<E, S>
where
    E: EnvironmentalDataProvider,
    S: SpatialDataProvider,
{
    pub fn new(engine: Arc<EvaluationEngine<E, S>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EvaluationEngine<E, S> {
        &self.engine
    }

    /// Assign plots to applications, at most one each way.
    ///
    /// Pairs are enumerated application-major, evaluated up to the configured concurrency
    /// limit, and ranked by combined score with ties going to the lexicographically lower
    /// plot id, then application id, then input position. Unallocated applications keep
    /// their input order.
    pub async fn optimize(
        &self,
        applications: &[Application],
        plots: &[Plot],
    ) -> Result<AllocationOutcome, AllocationError> {
        if applications.is_empty() || plots.is_empty() {
            info!(
                applications = applications.len(),
                plots = plots.len(),
                "nothing to allocate"
            );
            return Ok(AllocationOutcome::nothing_allocated(applications));
        }

        info!(
            applications = applications.len(),
            plots = plots.len(),
            "evaluating allocation candidates"
        );

        let limit = self.engine.config().concurrency_limit();
        let pairs = (0..applications.len()).flat_map(|application_index| {
            (0..plots.len()).map(move |plot_index| (application_index, plot_index))
        });

        let outcomes: Vec<PairOutcome> = stream::iter(pairs)
            .map(|(application_index, plot_index)| {
                let engine = Arc::clone(&self.engine);
                let plot = plots[plot_index].clone();
                let application = applications[application_index].clone();
                async move { evaluate_pair(&engine, &plot, &application, application_index).await }
            })
            .buffered(limit)
            .try_collect()
            .await?;

        let evaluated_pairs = outcomes.len();
        let mut scored = Vec::with_capacity(evaluated_pairs);
        let mut excluded_pairs = Vec::new();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Scored(application_index, evaluation) => {
                    scored.push((application_index, evaluation))
                }
                PairOutcome::Excluded(pair) => excluded_pairs.push(pair),
            }
        }

        scored.sort_by(|(left_index, left), (right_index, right)| {
            rank(left, right).then_with(|| left_index.cmp(right_index))
        });

        // Applications are tracked by input position so entries sharing an id are
        // still allocated or reported individually. Plots stay keyed by id.
        let mut used_plots: HashSet<PlotId> = HashSet::new();
        let mut used_applications: HashSet<usize> = HashSet::new();
        let mut allocations = Vec::new();

        for (application_index, evaluation) in scored {
            if !evaluation.recommendation.is_approve()
                || used_plots.contains(evaluation.plot_id())
                || used_applications.contains(&application_index)
            {
                continue;
            }

            let application = &applications[application_index];
            used_plots.insert(evaluation.plot.id.clone());
            used_applications.insert(application_index);
            allocations.push(Allocation {
                combined_score: evaluation.combined_score,
                suitability_score: evaluation.suitability.score,
                equity_score: evaluation.equity.score,
                evaluated_at: evaluation.evaluated_at,
                plot: evaluation.plot,
                application: application.clone(),
            });
        }

        let unallocated_applications: Vec<Application> = applications
            .iter()
            .enumerate()
            .filter(|(index, _)| !used_applications.contains(index))
            .map(|(_, application)| application.clone())
            .collect();

        info!(
            allocated = allocations.len(),
            unallocated = unallocated_applications.len(),
            excluded = excluded_pairs.len(),
            evaluated = evaluated_pairs,
            "allocation run complete"
        );

        Ok(AllocationOutcome {
            allocations,
            unallocated_applications,
            excluded_pairs,
            evaluated_pairs,
        })
    }
}

async fn evaluate_pair<E, S>(
    engine: &EvaluationEngine<E, S>,
    plot: &Plot,
    application: &Application,
    application_index: usize,
) -> Result<PairOutcome, AllocationError>
where
    E: EnvironmentalDataProvider,
    S: SpatialDataProvider,
{
    match engine.evaluate_plot_suitability(plot, application).await {
        Ok(evaluation) => Ok(PairOutcome::Scored(application_index, evaluation)),
        Err(EvaluationError::InvalidInput(reason)) => {
            warn!(
                plot = %plot.id,
                application = %application.id,
                %reason,
                "pair excluded from allocation"
            );
            Ok(PairOutcome::Excluded(ExcludedPair {
                plot_id: plot.id.clone(),
                application_id: application.id.clone(),
                reason,
            }))
        }
        Err(EvaluationError::Provider(source)) => {
            error!(
                plot = %plot.id,
                application = %application.id,
                error = %source,
                "provider failure aborted allocation run"
            );
            Err(AllocationError::Provider {
                plot_id: plot.id.clone(),
                application_id: application.id.clone(),
                source,
            })
        }
    }
}

/// Descending combined score, then plot id, then application id. Ids compare as
/// strings, so `plot-10` ranks ahead of `plot-2`.
fn rank(left: &Evaluation, right: &Evaluation) -> Ordering {
    right
        .combined_score
        .total_cmp(&left.combined_score)
        .then_with(|| left.plot.id.cmp(&right.plot.id))
        .then_with(|| left.application_id.cmp(&right.application_id))
}
