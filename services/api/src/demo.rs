use crate::infra::{fixture_service, AllocationFixture, RegisteredPlot};
use chrono::SecondsFormat;
use clap::Args;
use land_allocation::allocation::{
    AllocationRunRecord, Applicant, Application, ApplicationId, ConflictDetail,
    EnvironmentalFactors, EvaluationConfig, Gender, Geometry, IncomeLevel, LandUse,
    PlotAttributes, PlotId,
};
use land_allocation::config::AppConfig;
use land_allocation::error::AppError;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct OptimizeArgs {
    /// JSON registry export with plots and applications to allocate
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Print the full run record as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the full run record as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
    /// Write the synthetic county fixture to this path for reuse with `optimize`
    #[arg(long)]
    pub(crate) export_fixture: Option<PathBuf>,
}

pub(crate) async fn run_optimize(args: OptimizeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fixture = AllocationFixture::load(&args.fixture).await?;
    let record = allocate(&fixture, config.evaluation).await?;
    print_record(&record, args.json)
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let fixture = county_fixture();

    if let Some(path) = args.export_fixture {
        let raw = serde_json::to_string_pretty(&fixture)?;
        tokio::fs::write(&path, raw).await?;
        println!("Fixture written to {}", path.display());
    }

    if !args.json {
        println!(
            "Land allocation demo: {} plots, {} applications",
            fixture.plots.len(),
            fixture.applications.len()
        );
    }
    let record = allocate(&fixture, config.evaluation).await?;
    print_record(&record, args.json)
}

pub(crate) async fn allocate(
    fixture: &AllocationFixture,
    config: EvaluationConfig,
) -> Result<AllocationRunRecord, AppError> {
    let (service, outbox) = fixture_service(fixture, config);
    let record = service.run(fixture.request()).await?;
    tracing::debug!(notices = outbox.notices().len(), "allocation notices queued");
    Ok(record)
}

fn print_record(record: &AllocationRunRecord, as_json: bool) -> Result<(), AppError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        for line in report_lines(record) {
            println!("{line}");
        }
    }
    Ok(())
}

pub(crate) fn report_lines(record: &AllocationRunRecord) -> Vec<String> {
    let outcome = &record.outcome;
    let mut lines = vec![
        format!(
            "Run {} requested {}",
            record.run_id,
            record
                .requested_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!(
            "{} pairs evaluated | {} allocated | {} excluded | {} unallocated",
            outcome.evaluated_pairs,
            outcome.allocations.len(),
            outcome.excluded_pairs.len(),
            outcome.unallocated_applications.len()
        ),
    ];

    lines.push(String::new());
    lines.push("Allocations".to_string());
    if outcome.allocations.is_empty() {
        lines.push("- none".to_string());
    }
    for allocation in &outcome.allocations {
        let plot = match &allocation.plot.label {
            Some(label) => format!("{} ({label})", allocation.plot.id),
            None => allocation.plot.id.to_string(),
        };
        lines.push(format!(
            "- {plot} -> {} [{}] combined {:.2} | suitability {:.2} | equity {:.2}",
            allocation.application.id,
            allocation.application.applicant.name,
            allocation.combined_score,
            allocation.suitability_score,
            allocation.equity_score
        ));
    }

    if !outcome.excluded_pairs.is_empty() {
        lines.push(String::new());
        lines.push("Excluded pairs".to_string());
        for pair in &outcome.excluded_pairs {
            lines.push(format!(
                "- {} x {}: {}",
                pair.plot_id, pair.application_id, pair.reason
            ));
        }
    }

    if !outcome.unallocated_applications.is_empty() {
        lines.push(String::new());
        lines.push("Unallocated applications".to_string());
        for application in &outcome.unallocated_applications {
            lines.push(format!(
                "- {} [{}]",
                application.id, application.applicant.name
            ));
        }
    }

    lines
}

fn parcel(
    id: &str,
    label: &str,
    zoning: LandUse,
    environment: [f64; 4],
    services: [bool; 4],
) -> RegisteredPlot {
    let [water_access, soil_quality, flood_risk, climate_resilience] = environment;
    let [road_access, utilities, public_transport, community_facilities] = services;
    RegisteredPlot {
        id: PlotId(id.to_string()),
        label: Some(label.to_string()),
        environment: EnvironmentalFactors {
            water_access,
            soil_quality,
            flood_risk,
            climate_resilience,
        },
        attributes: PlotAttributes {
            zoning: Some(zoning),
            road_access,
            utilities,
            public_transport,
            community_facilities,
            geometry: Geometry(json!({ "type": "Point", "coordinates": [36.78, -1.85] })),
        },
        boundary_disputes: Vec::new(),
        competing_claims: Vec::new(),
        customary_rights: Vec::new(),
    }
}

fn applicant(
    id: &str,
    name: &str,
    profile: (Gender, IncomeLevel, Option<u8>),
    is_tribesman: bool,
    intended_use: LandUse,
) -> Application {
    let (gender, income_level, age) = profile;
    Application {
        id: ApplicationId(id.to_string()),
        applicant: Applicant {
            name: name.to_string(),
            gender: Some(gender),
            income_level: Some(income_level),
            is_tribesman,
            has_disability: false,
            age,
        },
        intended_use: Some(intended_use),
        acknowledges_customary_rights: false,
    }
}

/// Synthetic county round. KJD-203 carries a boundary dispute and app-1006 omits the
/// applicant's age.
pub(crate) fn county_fixture() -> AllocationFixture {
    let mut corridor = parcel(
        "KJD-202",
        "Olooloitikosh farm block",
        LandUse::Agricultural,
        [0.8, 0.9, 0.2, 0.7],
        [true, false, false, true],
    );
    corridor.customary_rights.push(ConflictDetail {
        reference: "CR-12".to_string(),
        description: "seasonal grazing corridor".to_string(),
        claimant: Some("Ilkisongo group ranch".to_string()),
    });

    let mut disputed = parcel(
        "KJD-203",
        "Kitengela riverside",
        LandUse::Residential,
        [1.0, 0.9, 0.0, 0.9],
        [true, true, true, true],
    );
    disputed.boundary_disputes.push(ConflictDetail {
        reference: "BD-2024-118".to_string(),
        description: "beacon overlap with KJD-204".to_string(),
        claimant: None,
    });

    let plots = vec![
        parcel(
            "KJD-201",
            "Isinya estate",
            LandUse::Residential,
            [0.9, 0.8, 0.1, 0.8],
            [true, true, true, false],
        ),
        corridor,
        disputed,
        parcel(
            "KJD-204",
            "Kitengela market frontage",
            LandUse::Commercial,
            [0.7, 0.5, 0.3, 0.6],
            [true, true, true, false],
        ),
        parcel(
            "KJD-205",
            "Mashuuru outskirts",
            LandUse::Residential,
            [0.6, 0.6, 0.4, 0.5],
            [true, false, false, false],
        ),
    ];

    let mut herder = applicant(
        "app-1002",
        "Lemayian",
        (Gender::Male, IncomeLevel::Middle, Some(44)),
        true,
        LandUse::Agricultural,
    );
    herder.acknowledges_customary_rights = true;

    let mut trader = applicant(
        "app-1003",
        "Amina",
        (Gender::Female, IncomeLevel::Middle, Some(38)),
        false,
        LandUse::Commercial,
    );
    trader.applicant.has_disability = true;

    let applications = vec![
        applicant(
            "app-1001",
            "Wanjiru",
            (Gender::Female, IncomeLevel::Low, Some(29)),
            false,
            LandUse::Residential,
        ),
        herder,
        trader,
        applicant(
            "app-1004",
            "Otieno",
            (Gender::Male, IncomeLevel::Low, Some(33)),
            false,
            LandUse::Residential,
        ),
        applicant(
            "app-1005",
            "Naserian",
            (Gender::Female, IncomeLevel::Low, Some(52)),
            true,
            LandUse::Agricultural,
        ),
        applicant(
            "app-1006",
            "Chebet",
            (Gender::Female, IncomeLevel::Low, None),
            false,
            LandUse::Residential,
        ),
    ];

    AllocationFixture {
        plots,
        applications,
    }
}
