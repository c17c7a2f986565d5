use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Application, Plot, RunId};
use super::evaluation::EvaluationError;
use super::ledger::{AllocationLedger, AllocationNotifier, AllocationRunSummary, LedgerError};
use super::providers::{EnvironmentalDataProvider, SpatialDataProvider};
use super::service::{AllocationRequest, AllocationService, AllocationServiceError};

const DEFAULT_RECENT_LIMIT: usize = 20;

/// Body for scoring a single pair.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub plot: Plot,
    pub application: Application,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecentQuery {
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing the allocation endpoints.
pub fn allocation_router<E, S, L, N>(service: Arc<AllocationService<E, S, L, N>>) -> Router
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    Router::new()
        .route("/api/v1/allocations", get(recent_handler::<E, S, L, N>))
        .route(
            "/api/v1/allocations/optimize",
            post(optimize_handler::<E, S, L, N>),
        )
        .route(
            "/api/v1/allocations/evaluate",
            post(evaluate_handler::<E, S, L, N>),
        )
        .route(
            "/api/v1/allocations/:run_id",
            get(run_handler::<E, S, L, N>),
        )
        .with_state(service)
}

pub(crate) async fn optimize_handler<E, S, L, N>(
    State(service): State<Arc<AllocationService<E, S, L, N>>>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    match service.run(request).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(AllocationServiceError::Allocation(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn evaluate_handler<E, S, L, N>(
    State(service): State<Arc<AllocationService<E, S, L, N>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    match service.evaluate(&request.plot, &request.application).await {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation)).into_response(),
        Err(EvaluationError::InvalidInput(reason)) => {
            let payload = json!({
                "error": reason.to_string(),
                "reason": reason,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(EvaluationError::Provider(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn run_handler<E, S, L, N>(
    State(service): State<Arc<AllocationService<E, S, L, N>>>,
    Path(run_id): Path<String>,
) -> Response
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    let id = RunId(run_id);
    match service.get(&id) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary_view())).into_response(),
        Err(AllocationServiceError::Ledger(LedgerError::NotFound)) => {
            let payload = json!({
                "run_id": id.0,
                "error": "allocation run not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn recent_handler<E, S, L, N>(
    State(service): State<Arc<AllocationService<E, S, L, N>>>,
    Query(query): Query<RecentQuery>,
) -> Response
where
    E: EnvironmentalDataProvider + 'static,
    S: SpatialDataProvider + 'static,
    L: AllocationLedger + 'static,
    N: AllocationNotifier + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    match service.recent(limit) {
        Ok(records) => {
            let runs: Vec<AllocationRunSummary> = records
                .iter()
                .map(|record| record.summary_view())
                .collect();
            (StatusCode::OK, axum::Json(json!({ "runs": runs }))).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
