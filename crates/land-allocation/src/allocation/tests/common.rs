use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::allocation::domain::{
    Applicant, Application, ApplicationId, EnvironmentalFactors, Gender, Geometry, IncomeLevel,
    LandUse, Plot, PlotAttributes, PlotId, PlotSnapshot, RunId,
};
use crate::allocation::evaluation::{CommunityImpactRule, EvaluationConfig, EvaluationEngine};
use crate::allocation::ledger::{
    AllocationLedger, AllocationNotice, AllocationNotifier, AllocationRunRecord, LedgerError,
    NoticeError,
};
use crate::allocation::optimizer::AllocationOptimizer;
use crate::allocation::providers::{
    ConflictDetail, EnvironmentalDataProvider, ProviderError, SpatialDataProvider,
};
use crate::allocation::service::AllocationService;

pub(super) fn ideal_factors() -> EnvironmentalFactors {
    EnvironmentalFactors {
        water_access: 1.0,
        soil_quality: 1.0,
        flood_risk: 0.0,
        climate_resilience: 1.0,
    }
}

pub(super) fn serviced_attributes(zoning: LandUse) -> PlotAttributes {
    PlotAttributes {
        zoning: Some(zoning),
        road_access: true,
        utilities: true,
        public_transport: true,
        community_facilities: true,
        geometry: Geometry(serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[36.80, -1.28], [36.81, -1.28], [36.81, -1.29], [36.80, -1.28]]]
        })),
    }
}

pub(super) fn snapshot(id: &str, attributes: PlotAttributes) -> PlotSnapshot {
    PlotSnapshot {
        id: PlotId(id.to_string()),
        label: None,
        attributes,
        environment: ideal_factors(),
    }
}

/// Female, low income, under 35, no tribal entitlement: 85 equity points.
pub(super) fn priority_applicant(name: &str) -> Applicant {
    Applicant {
        name: name.to_string(),
        gender: Some(Gender::Female),
        income_level: Some(IncomeLevel::Low),
        is_tribesman: false,
        has_disability: false,
        age: Some(27),
    }
}

/// Matches none of the equity predicates.
pub(super) fn baseline_applicant(name: &str) -> Applicant {
    Applicant {
        name: name.to_string(),
        gender: Some(Gender::Male),
        income_level: Some(IncomeLevel::High),
        is_tribesman: true,
        has_disability: false,
        age: Some(52),
    }
}

pub(super) fn application(id: &str, applicant: Applicant, intended_use: LandUse) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        applicant,
        intended_use: Some(intended_use),
        acknowledges_customary_rights: false,
    }
}

pub(super) fn plots(ids: &[&str]) -> Vec<Plot> {
    ids.iter().map(|id| Plot::new(*id)).collect()
}

pub(super) fn evaluation_config() -> EvaluationConfig {
    EvaluationConfig {
        provider_timeout_ms: 200,
        max_concurrent_evaluations: 4,
    }
}

pub(super) fn conflict(reference: &str) -> ConflictDetail {
    ConflictDetail {
        reference: reference.to_string(),
        description: format!("register entry {reference}"),
        claimant: Some("Kamau family".to_string()),
    }
}

/// Community rule awarding full credit to every pairing.
pub(super) struct FullCommunityCredit;

impl CommunityImpactRule for FullCommunityCredit {
    fn impact(&self, _plot: &PlotSnapshot, _application: &Application) -> f64 {
        1.0
    }
}

#[derive(Default)]
pub(super) struct MemoryEnvironment {
    factors: Mutex<HashMap<PlotId, EnvironmentalFactors>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Option<Duration>,
    outage: bool,
}

impl MemoryEnvironment {
    pub(super) fn with_plots(ids: &[&str]) -> Self {
        let env = Self::default();
        for id in ids {
            env.set(id, ideal_factors());
        }
        env
    }

    pub(super) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn unavailable() -> Self {
        Self {
            outage: true,
            ..Self::default()
        }
    }

    pub(super) fn set(&self, id: &str, factors: EnvironmentalFactors) {
        self.factors
            .lock()
            .expect("environment mutex poisoned")
            .insert(PlotId(id.to_string()), factors);
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnvironmentalDataProvider for MemoryEnvironment {
    async fn environmental_factors(
        &self,
        plot_id: &PlotId,
    ) -> Result<EnvironmentalFactors, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage {
            return Err(ProviderError::Unavailable {
                provider: "environmental",
                message: "sensor feed offline".to_string(),
            });
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let factors = self
            .factors
            .lock()
            .expect("environment mutex poisoned")
            .get(plot_id)
            .copied();
        factors.ok_or_else(|| ProviderError::PlotNotFound(plot_id.clone()))
    }
}

#[derive(Default)]
pub(super) struct MemorySpatial {
    attributes: Mutex<HashMap<PlotId, PlotAttributes>>,
    boundary: Mutex<HashMap<PlotId, Vec<ConflictDetail>>>,
    claims: Mutex<HashMap<PlotId, Vec<ConflictDetail>>>,
    customary: Mutex<HashMap<PlotId, Vec<ConflictDetail>>>,
    failing_register: Option<&'static str>,
    slow_register: Option<(&'static str, Duration)>,
}

impl MemorySpatial {
    pub(super) fn with_plots(ids: &[&str], zoning: LandUse) -> Self {
        let spatial = Self::default();
        for id in ids {
            spatial.set_attributes(id, serviced_attributes(zoning));
        }
        spatial
    }

    pub(super) fn failing(mut self, register: &'static str) -> Self {
        self.failing_register = Some(register);
        self
    }

    pub(super) fn slow(mut self, register: &'static str, delay: Duration) -> Self {
        self.slow_register = Some((register, delay));
        self
    }

    pub(super) fn set_attributes(&self, id: &str, attributes: PlotAttributes) {
        self.attributes
            .lock()
            .expect("spatial mutex poisoned")
            .insert(PlotId(id.to_string()), attributes);
    }

    pub(super) fn add_boundary_dispute(&self, id: &str, detail: ConflictDetail) {
        push(&self.boundary, id, detail);
    }

    pub(super) fn add_competing_claim(&self, id: &str, detail: ConflictDetail) {
        push(&self.claims, id, detail);
    }

    pub(super) fn add_customary_right(&self, id: &str, detail: ConflictDetail) {
        push(&self.customary, id, detail);
    }

    async fn register(
        &self,
        name: &'static str,
        register: &Mutex<HashMap<PlotId, Vec<ConflictDetail>>>,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        if let Some((slow, delay)) = self.slow_register {
            if slow == name {
                tokio::time::sleep(delay).await;
            }
        }
        if self.failing_register == Some(name) {
            return Err(ProviderError::Unavailable {
                provider: "spatial",
                message: format!("{name} register offline"),
            });
        }
        Ok(register
            .lock()
            .expect("spatial mutex poisoned")
            .get(plot_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn push(register: &Mutex<HashMap<PlotId, Vec<ConflictDetail>>>, id: &str, detail: ConflictDetail) {
    register
        .lock()
        .expect("spatial mutex poisoned")
        .entry(PlotId(id.to_string()))
        .or_default()
        .push(detail);
}

#[async_trait]
impl SpatialDataProvider for MemorySpatial {
    async fn plot_attributes(&self, plot_id: &PlotId) -> Result<PlotAttributes, ProviderError> {
        if self.failing_register == Some("plot_attributes") {
            return Err(ProviderError::Unavailable {
                provider: "spatial",
                message: "parcel registry offline".to_string(),
            });
        }
        let attributes = self
            .attributes
            .lock()
            .expect("spatial mutex poisoned")
            .get(plot_id)
            .cloned();
        attributes.ok_or_else(|| ProviderError::PlotNotFound(plot_id.clone()))
    }

    async fn boundary_disputes(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        self.register("boundary_disputes", &self.boundary, plot_id)
            .await
    }

    async fn competing_claims(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        self.register("competing_claims", &self.claims, plot_id).await
    }

    async fn customary_rights(
        &self,
        plot_id: &PlotId,
    ) -> Result<Vec<ConflictDetail>, ProviderError> {
        self.register("customary_rights", &self.customary, plot_id)
            .await
    }
}

pub(super) fn engine(
    environment: Arc<MemoryEnvironment>,
    spatial: Arc<MemorySpatial>,
) -> EvaluationEngine<MemoryEnvironment, MemorySpatial> {
    EvaluationEngine::new(environment, spatial, evaluation_config())
}

pub(super) fn full_credit_engine(
    environment: Arc<MemoryEnvironment>,
    spatial: Arc<MemorySpatial>,
) -> EvaluationEngine<MemoryEnvironment, MemorySpatial> {
    EvaluationEngine::with_community_rule(
        environment,
        spatial,
        Arc::new(FullCommunityCredit),
        evaluation_config(),
    )
}

pub(super) fn optimizer(
    environment: Arc<MemoryEnvironment>,
    spatial: Arc<MemorySpatial>,
) -> AllocationOptimizer<MemoryEnvironment, MemorySpatial> {
    AllocationOptimizer::new(Arc::new(engine(environment, spatial)))
}

pub(super) type TestService =
    AllocationService<MemoryEnvironment, MemorySpatial, MemoryLedger, MemoryNotices>;

pub(super) fn build_service(
    environment: MemoryEnvironment,
    spatial: MemorySpatial,
) -> (TestService, Arc<MemoryLedger>, Arc<MemoryNotices>) {
    let ledger = Arc::new(MemoryLedger::default());
    let notices = Arc::new(MemoryNotices::default());
    let service = AllocationService::new(
        Arc::new(environment),
        Arc::new(spatial),
        ledger.clone(),
        notices.clone(),
        evaluation_config(),
    );
    (service, ledger, notices)
}

#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    records: Arc<Mutex<Vec<AllocationRunRecord>>>,
}

impl AllocationLedger for MemoryLedger {
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

impl MemoryLedger {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("ledger mutex poisoned").len()
    }
}

pub(super) struct UnavailableLedger;

impl AllocationLedger for UnavailableLedger {
    fn record(&self, _record: AllocationRunRecord) -> Result<AllocationRunRecord, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn fetch(&self, _id: &RunId) -> Result<Option<AllocationRunRecord>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<AllocationRunRecord>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotices {
    events: Arc<Mutex<Vec<AllocationNotice>>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<AllocationNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl AllocationNotifier for MemoryNotices {
    fn publish(&self, notice: AllocationNotice) -> Result<(), NoticeError> {
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotices;

impl AllocationNotifier for FailingNotices {
    fn publish(&self, _notice: AllocationNotice) -> Result<(), NoticeError> {
        Err(NoticeError::Transport("sms gateway down".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
