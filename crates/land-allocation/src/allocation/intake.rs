use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, PlotId, PlotSnapshot};

/// Demographic fields the equity rubric cannot score without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicField {
    Gender,
    IncomeLevel,
    Age,
}

/// Malformed application or plot data detected before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidInput {
    #[error("application {application_id} does not declare an intended use")]
    MissingIntendedUse { application_id: ApplicationId },
    #[error("application {application_id} is missing applicant {field:?}")]
    MissingDemographic {
        application_id: ApplicationId,
        field: DemographicField,
    },
    #[error("plot {plot_id} has no zoning category")]
    MissingZoning { plot_id: PlotId },
    #[error("plot {plot_id} reported a non-finite {factor} reading")]
    NonFiniteFactor { plot_id: PlotId, factor: String },
}

/// Rejects applications that cannot be scored. Runs before any provider call.
pub(crate) fn check_application(application: &Application) -> Result<(), InvalidInput> {
    if application.intended_use.is_none() {
        return Err(InvalidInput::MissingIntendedUse {
            application_id: application.id.clone(),
        });
    }

    let applicant = &application.applicant;
    let missing = if applicant.gender.is_none() {
        Some(DemographicField::Gender)
    } else if applicant.income_level.is_none() {
        Some(DemographicField::IncomeLevel)
    } else if applicant.age.is_none() {
        Some(DemographicField::Age)
    } else {
        None
    };

    match missing {
        Some(field) => Err(InvalidInput::MissingDemographic {
            application_id: application.id.clone(),
            field,
        }),
        None => Ok(()),
    }
}

/// Rejects provider snapshots that cannot be scored.
///
/// Finite readings outside `[0, 1]` pass; the scorer clamps its output instead.
pub(crate) fn check_snapshot(snapshot: &PlotSnapshot) -> Result<(), InvalidInput> {
    if snapshot.attributes.zoning.is_none() {
        return Err(InvalidInput::MissingZoning {
            plot_id: snapshot.id.clone(),
        });
    }

    if let Some((factor, _)) = snapshot
        .environment
        .named()
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(InvalidInput::NonFiniteFactor {
            plot_id: snapshot.id.clone(),
            factor: factor.to_string(),
        });
    }

    Ok(())
}
