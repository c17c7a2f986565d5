use super::common::*;
use crate::allocation::domain::{Gender, IncomeLevel};
use crate::allocation::evaluation::{score_equity, ScoreFactor};

#[test]
fn priority_applicant_collects_matching_weights() {
    let breakdown = score_equity(&priority_applicant("Achieng"));

    assert_eq!(breakdown.score, 85.0);
    let factors: Vec<ScoreFactor> = breakdown
        .components
        .iter()
        .map(|component| component.factor)
        .collect();
    assert_eq!(
        factors,
        vec![
            ScoreFactor::FemaleApplicant,
            ScoreFactor::LowIncome,
            ScoreFactor::NonTribalApplicant,
            ScoreFactor::Youth,
        ]
    );
}

#[test]
fn every_predicate_reaches_the_ceiling() {
    let mut applicant = priority_applicant("Nyokabi");
    applicant.has_disability = true;

    let breakdown = score_equity(&applicant);

    assert_eq!(breakdown.score, 100.0);
    assert_eq!(breakdown.components.len(), 5);
}

#[test]
fn applicant_matching_nothing_scores_zero() {
    let breakdown = score_equity(&baseline_applicant("Otieno"));

    assert_eq!(breakdown.score, 0.0);
    assert!(breakdown.components.is_empty());
}

#[test]
fn youth_bonus_stops_at_thirty_five() {
    let mut applicant = baseline_applicant("Kiprop");
    applicant.age = Some(34);
    assert_eq!(score_equity(&applicant).score, 25.0);

    applicant.age = Some(35);
    assert_eq!(score_equity(&applicant).score, 0.0);
}

#[test]
fn other_genders_and_middle_income_earn_nothing() {
    let mut applicant = baseline_applicant("Amani");
    applicant.gender = Some(Gender::Other);
    applicant.income_level = Some(IncomeLevel::Middle);

    assert_eq!(score_equity(&applicant).score, 0.0);
}

#[test]
fn scoring_is_deterministic() {
    let applicant = priority_applicant("Wambui");

    assert_eq!(score_equity(&applicant), score_equity(&applicant));
}
