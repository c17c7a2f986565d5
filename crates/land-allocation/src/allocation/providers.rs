//! Collaborator contracts for environmental and spatial data.
//!
//! The engine treats providers as black boxes: no caching is assumed, and any
//! failure surfaces as a [`ProviderError`] instead of a default score.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{EnvironmentalFactors, PlotAttributes, PlotId};

/// Supplies per-parcel environmental readings.
#[async_trait]
pub trait EnvironmentalDataProvider: Send + Sync {
    async fn environmental_factors(
        &self,
        plot_id: &PlotId,
    ) -> Result<EnvironmentalFactors, ProviderError>;
}

/// Supplies parcel attributes and the three conflict registers.
#[async_trait]
pub trait SpatialDataProvider: Send + Sync {
    async fn plot_attributes(&self, plot_id: &PlotId) -> Result<PlotAttributes, ProviderError>;
    async fn boundary_disputes(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError>;
    async fn competing_claims(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError>;
    async fn customary_rights(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError>;
}

#[async_trait]
impl<T> EnvironmentalDataProvider for Arc<T>
where
    T: EnvironmentalDataProvider + ?Sized,
{
    async fn environmental_factors(
        &self,
        plot_id: &PlotId,
    ) -> Result<EnvironmentalFactors, ProviderError> {
        (**self).environmental_factors(plot_id).await
    }
}

#[async_trait]
impl<T> SpatialDataProvider for Arc<T>
where
    T: SpatialDataProvider + ?Sized,
{
    async fn plot_attributes(&self, plot_id: &PlotId) -> Result<PlotAttributes, ProviderError> {
        (**self).plot_attributes(plot_id).await
    }

    async fn boundary_disputes(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        (**self).boundary_disputes(plot_id).await
    }

    async fn competing_claims(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        (**self).competing_claims(plot_id).await
    }

    async fn customary_rights(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        (**self).customary_rights(plot_id).await
    }
}

/// Raw conflict record as returned by a spatial register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictDetail {
    pub reference: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimant: Option<String>,
}

/// Failure raised by an environmental or spatial collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} provider unavailable: {message}")]
    Unavailable {
        provider: &'static str,
        message: String,
    },
    #[error("plot {0} not known to provider")]
    PlotNotFound(PlotId),
    #[error("{operation} timed out after {timeout_ms}ms")]
    TimedOut {
        operation: &'static str,
        timeout_ms: u64,
    },
}

/// Runs a provider call under `timeout`; an elapsed timer counts as a provider failure.
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::TimedOut {
            operation,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Wraps an environmental provider with a per-plot cache it owns.
///
/// Only successful lookups are cached; a failed lookup is retried on the next call.
pub struct MemoizedEnvironmentalProvider<P> {
    inner: P,
    cache: Mutex<HashMap<PlotId, EnvironmentalFactors>>,
}

impl<P> MemoizedEnvironmentalProvider<P>
where
    P: EnvironmentalDataProvider,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_plots(&self) -> usize {
        self.cache.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            guard.clear();
        }
    }

    fn lookup(&self, plot_id: &PlotId) -> Option<EnvironmentalFactors> {
        self.cache
            .lock()
            .ok()
            .and_then(|guard| guard.get(plot_id).copied())
    }
}

#[async_trait]
impl<P> EnvironmentalDataProvider for MemoizedEnvironmentalProvider<P>
where
    P: EnvironmentalDataProvider,
{
    async fn environmental_factors(
        &self,
        plot_id: &PlotId,
    ) -> Result<EnvironmentalFactors, ProviderError> {
        if let Some(factors) = self.lookup(plot_id) {
            return Ok(factors);
        }

        let factors = self.inner.environmental_factors(plot_id).await?;
        if let Ok(mut guard) = self.cache.lock() {
            guard.insert(plot_id.clone(), factors);
        }
        Ok(factors)
    }
}
