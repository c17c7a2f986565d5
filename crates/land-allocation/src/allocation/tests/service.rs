use std::sync::Arc;

use super::common::*;
use crate::allocation::domain::{LandUse, Plot, RunId};
use crate::allocation::evaluation::EvaluationEngine;
use crate::allocation::ledger::{LedgerError, NoticeError};
use crate::allocation::optimizer::AllocationError;
use crate::allocation::service::{AllocationRequest, AllocationService, AllocationServiceError};

fn request(plot_ids: &[&str]) -> AllocationRequest {
    AllocationRequest {
        applications: vec![
            application("app-1", priority_applicant("Wanjiru"), LandUse::Residential),
            application("app-2", baseline_applicant("Mutua"), LandUse::Residential),
        ],
        plots: plots(plot_ids),
    }
}

#[tokio::test]
async fn run_records_outcome_and_notifies_allocated_applicants() {
    let (service, ledger, notices) = build_service(
        MemoryEnvironment::with_plots(&["plot-1"]),
        MemorySpatial::with_plots(&["plot-1"], LandUse::Residential),
    );

    let record = service.run(request(&["plot-1"])).await.expect("run succeeds");

    assert!(record.run_id.0.starts_with("run-"));
    assert_eq!(record.outcome.allocations.len(), 1);
    assert_eq!(ledger.len(), 1);

    let events = notices.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "plot_allocated");
    assert_eq!(events[0].run_id, record.run_id);
    assert_eq!(events[0].application_id.0, "app-1");
    assert_eq!(events[0].details.get("plot_id"), Some(&"plot-1".to_string()));
    assert_eq!(
        events[0].details.get("combined_score"),
        Some(&"92.00".to_string())
    );
}

#[tokio::test]
async fn run_ids_are_unique_across_runs() {
    let (service, ledger, _) = build_service(
        MemoryEnvironment::with_plots(&["plot-1"]),
        MemorySpatial::with_plots(&["plot-1"], LandUse::Residential),
    );

    let first = service.run(request(&["plot-1"])).await.expect("first run");
    let second = service.run(request(&["plot-1"])).await.expect("second run");

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(ledger.len(), 2);
    let recent = service.recent(1).expect("recent runs");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].run_id, second.run_id);
}

#[tokio::test]
async fn recorded_run_can_be_fetched() {
    let (service, _, _) = build_service(
        MemoryEnvironment::with_plots(&["plot-1"]),
        MemorySpatial::with_plots(&["plot-1"], LandUse::Residential),
    );

    let record = service.run(request(&["plot-1"])).await.expect("run succeeds");
    let fetched = service.get(&record.run_id).expect("run stored");

    assert_eq!(fetched, record);
    let summary = fetched.summary_view();
    assert_eq!(summary.allocations.len(), 1);
    assert_eq!(summary.unallocated_applications.len(), 1);
    assert_eq!(summary.unallocated_applications[0].0, "app-2");
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let (service, _, _) = build_service(MemoryEnvironment::default(), MemorySpatial::default());

    let error = service
        .get(&RunId("run-999999".to_string()))
        .expect_err("unknown run");

    assert!(matches!(
        error,
        AllocationServiceError::Ledger(LedgerError::NotFound)
    ));
}

#[tokio::test]
async fn provider_outage_records_nothing() {
    let (service, ledger, notices) = build_service(
        MemoryEnvironment::unavailable(),
        MemorySpatial::with_plots(&["plot-1"], LandUse::Residential),
    );

    let error = service
        .run(request(&["plot-1"]))
        .await
        .expect_err("outage aborts");

    assert!(matches!(
        error,
        AllocationServiceError::Allocation(AllocationError::Provider { .. })
    ));
    assert_eq!(ledger.len(), 0);
    assert!(notices.events().is_empty());
}

#[tokio::test]
async fn ledger_outage_surfaces() {
    let engine = EvaluationEngine::new(
        Arc::new(MemoryEnvironment::with_plots(&["plot-1"])),
        Arc::new(MemorySpatial::with_plots(&["plot-1"], LandUse::Residential)),
        evaluation_config(),
    );
    let notices = Arc::new(MemoryNotices::default());
    let service = AllocationService::with_engine(engine, Arc::new(UnavailableLedger), notices.clone());

    let error = service
        .run(request(&["plot-1"]))
        .await
        .expect_err("ledger offline");

    assert!(matches!(
        error,
        AllocationServiceError::Ledger(LedgerError::Unavailable(_))
    ));
    assert!(notices.events().is_empty());
}

#[tokio::test]
async fn notice_failure_surfaces_after_recording() {
    let engine = EvaluationEngine::new(
        Arc::new(MemoryEnvironment::with_plots(&["plot-1"])),
        Arc::new(MemorySpatial::with_plots(&["plot-1"], LandUse::Residential)),
        evaluation_config(),
    );
    let ledger = Arc::new(MemoryLedger::default());
    let service = AllocationService::with_engine(engine, ledger.clone(), Arc::new(FailingNotices));

    let error = service
        .run(request(&["plot-1"]))
        .await
        .expect_err("gateway down");

    assert!(matches!(
        error,
        AllocationServiceError::Notice(NoticeError::Transport(_))
    ));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn evaluate_scores_a_single_pair() {
    let (service, ledger, _) = build_service(
        MemoryEnvironment::with_plots(&["plot-1"]),
        MemorySpatial::with_plots(&["plot-1"], LandUse::Residential),
    );
    let candidate = application("app-1", priority_applicant("Wanjiru"), LandUse::Residential);

    let evaluation = service
        .evaluate(&Plot::new("plot-1"), &candidate)
        .await
        .expect("pair evaluates");

    assert_eq!(evaluation.combined_score, 92.0);
    assert!(evaluation.recommendation.is_approve());
    assert_eq!(ledger.len(), 0);
}
