use crate::cli::ServeArgs;
use crate::demo::county_fixture;
use crate::infra::{fixture_service_with, AllocationFixture, AppState, LoggedNotices};
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use land_allocation::config::AppConfig;
use land_allocation::error::AppError;
use land_allocation::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let fixture = match args.fixture.take() {
        Some(path) => AllocationFixture::load(&path).await?,
        None => county_fixture(),
    };
    info!(
        plots = fixture.plots.len(),
        applications = fixture.applications.len(),
        "registry fixture loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let allocation_service =
        fixture_service_with(&fixture, config.evaluation.clone(), Arc::new(LoggedNotices));

    let app = with_allocation_routes(Arc::new(allocation_service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "land allocation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
