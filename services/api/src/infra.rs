use async_trait::async_trait;
use land_allocation::allocation::{
    AllocationLedger, AllocationNotice, AllocationNotifier, AllocationRequest,
    AllocationRunRecord, AllocationService, Application, ConflictDetail,
    EnvironmentalDataProvider, EnvironmentalFactors, EvaluationConfig, LedgerError,
    MemoizedEnvironmentalProvider, NoticeError, Plot, PlotAttributes, PlotId, ProviderError,
    RunId, SpatialDataProvider,
};
use land_allocation::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Parcel as recorded in a registry export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisteredPlot {
    pub(crate) id: PlotId,
    #[serde(default)]
    pub(crate) label: Option<String>,
    pub(crate) environment: EnvironmentalFactors,
    pub(crate) attributes: PlotAttributes,
    #[serde(default)]
    pub(crate) boundary_disputes: Vec<ConflictDetail>,
    #[serde(default)]
    pub(crate) competing_claims: Vec<ConflictDetail>,
    #[serde(default)]
    pub(crate) customary_rights: Vec<ConflictDetail>,
}

/// Registry export plus the applications to allocate against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AllocationFixture {
    pub(crate) plots: Vec<RegisteredPlot>,
    #[serde(default)]
    pub(crate) applications: Vec<Application>,
}

impl AllocationFixture {
    pub(crate) fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub(crate) async fn load(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    pub(crate) fn request(&self) -> AllocationRequest {
        AllocationRequest {
            applications: self.applications.clone(),
            plots: self
                .plots
                .iter()
                .map(|plot| Plot {
                    id: plot.id.clone(),
                    label: plot.label.clone(),
                })
                .collect(),
        }
    }
}

/// Serves both environmental and spatial lookups from a loaded fixture.
#[derive(Debug, Default)]
pub(crate) struct FixtureRegistry {
    plots: HashMap<PlotId, RegisteredPlot>,
}

impl FixtureRegistry {
    pub(crate) fn from_fixture(fixture: &AllocationFixture) -> Self {
        Self {
            plots: fixture
                .plots
                .iter()
                .map(|plot| (plot.id.clone(), plot.clone()))
                .collect(),
        }
    }

    fn plot(&self, plot_id: &PlotId) -> Result<&RegisteredPlot, ProviderError> {
        self.plots
            .get(plot_id)
            .ok_or_else(|| ProviderError::PlotNotFound(plot_id.clone()))
    }
}

#[async_trait]
impl EnvironmentalDataProvider for FixtureRegistry {
    async fn environmental_factors(
        &self,
        plot_id: &PlotId,
    ) -> Result<EnvironmentalFactors, ProviderError> {
        Ok(self.plot(plot_id)?.environment)
    }
}

#[async_trait]
impl SpatialDataProvider for FixtureRegistry {
    async fn plot_attributes(&self, plot_id: &PlotId) -> Result<PlotAttributes, ProviderError> {
        Ok(self.plot(plot_id)?.attributes.clone())
    }

    async fn boundary_disputes(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        Ok(self.plot(plot_id)?.boundary_disputes.clone())
    }

    async fn competing_claims(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        Ok(self.plot(plot_id)?.competing_claims.clone())
    }

    async fn customary_rights(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        Ok(self.plot(plot_id)?.customary_rights.clone())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAllocationLedger {
    records: Arc<Mutex<Vec<AllocationRunRecord>>>,
}

impl AllocationLedger for InMemoryAllocationLedger {
    fn record(&self, record: AllocationRunRecord) -> Result<AllocationRunRecord, LedgerError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        if guard.iter().any(|existing| existing.run_id == record.run_id) {
            return Err(LedgerError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &RunId) -> Result<Option<AllocationRunRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.iter().find(|record| &record.run_id == id).cloned())
    }

    fn recent(&self, limit: usize) -> Result<Vec<AllocationRunRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNoticeOutbox {
    notices: Arc<Mutex<Vec<AllocationNotice>>>,
}

impl AllocationNotifier for InMemoryNoticeOutbox {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError> {
        let mut guard = self.notices.lock().expect("outbox mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNoticeOutbox {
    pub(crate) fn notices(&self) -> Vec<AllocationNotice> {
        self.notices.lock().expect("outbox mutex poisoned").clone()
    }
}

/// Long-running notifier: writes each notice to the log and keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggedNotices;

impl AllocationNotifier for LoggedNotices {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError> {
        info!(
            template = %notice.template,
            run_id = %notice.run_id,
            application_id = %notice.application_id,
            details = ?notice.details,
            "allocation notice"
        );
        Ok(())
    }
}

pub(crate) type FixtureAllocationService<N = InMemoryNoticeOutbox> = AllocationService<
    MemoizedEnvironmentalProvider<Arc<FixtureRegistry>>,
    FixtureRegistry,
    InMemoryAllocationLedger,
    N,
>;

/// Wires a service whose providers answer from `fixture` and whose notices go to
/// `notifier`.
pub(crate) fn fixture_service_with<N>(
    fixture: &AllocationFixture,
    config: EvaluationConfig,
    notifier: Arc<N>,
) -> FixtureAllocationService<N>
where
    N: AllocationNotifier + 'static,
{
    let registry = Arc::new(FixtureRegistry::from_fixture(fixture));
    let environmental = Arc::new(MemoizedEnvironmentalProvider::new(registry.clone()));
    AllocationService::new(
        environmental,
        registry,
        Arc::new(InMemoryAllocationLedger::default()),
        notifier,
        config,
    )
}

/// One-shot variant for CLI runs. The returned outbox shares storage with the one
/// the service publishes to.
pub(crate) fn fixture_service(
    fixture: &AllocationFixture,
    config: EvaluationConfig,
) -> (FixtureAllocationService, InMemoryNoticeOutbox) {
    let outbox = InMemoryNoticeOutbox::default();
    let service = fixture_service_with(fixture, config, Arc::new(outbox.clone()));
    (service, outbox)
}
