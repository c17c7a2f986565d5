use serde::{Deserialize, Serialize};

use super::super::domain::{Applicant, Gender, IncomeLevel};
use super::{clamp_score, round_score, ScoreComponent, ScoreFactor};

const YOUTH_AGE_LIMIT: u8 = 35;

/// Equity total with the predicates that contributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityBreakdown {
    pub score: f64,
    pub components: Vec<ScoreComponent>,
}

/// Additive demographic rubric. Pure: identical applicants always score identically.
pub fn score_equity(applicant: &Applicant) -> EquityBreakdown {
    let predicates = [
        (
            applicant.gender == Some(Gender::Female),
            ScoreFactor::FemaleApplicant,
            0.30,
            "female applicant",
        ),
        (
            applicant.income_level == Some(IncomeLevel::Low),
            ScoreFactor::LowIncome,
            0.20,
            "low income household",
        ),
        (
            !applicant.is_tribesman,
            ScoreFactor::NonTribalApplicant,
            0.10,
            "no tribal land entitlement",
        ),
        (
            applicant.has_disability,
            ScoreFactor::Disability,
            0.15,
            "applicant with disability",
        ),
        (
            applicant.age.is_some_and(|age| age < YOUTH_AGE_LIMIT),
            ScoreFactor::Youth,
            0.25,
            "applicant under 35",
        ),
    ];

    let components: Vec<ScoreComponent> = predicates
        .into_iter()
        .filter(|(applies, _, _, _)| *applies)
        .map(|(_, factor, weight, notes)| ScoreComponent {
            factor,
            points: round_score(weight * 100.0),
            notes: notes.to_string(),
        })
        .collect();

    let score = clamp_score(components.iter().map(|component| component.points).sum());

    EquityBreakdown { score, components }
}
