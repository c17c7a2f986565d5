use serde::{Deserialize, Serialize};

use super::super::domain::{Application, PlotSnapshot};
use super::{clamp_score, round_score, ScoreComponent, ScoreFactor};

const ENVIRONMENTAL_POINTS: f64 = 40.0;
const INFRASTRUCTURE_POINTS: f64 = 30.0;
const ZONING_POINTS: f64 = 20.0;
const COMMUNITY_IMPACT_POINTS: f64 = 10.0;

/// Pluggable rule rating how a pairing affects the surrounding community, in `[0, 1]`.
pub trait CommunityImpactRule: Send + Sync {
    fn impact(&self, plot: &PlotSnapshot, application: &Application) -> f64;
}

/// Rule used when no community assessment is wired in; awards half credit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralCommunityImpact;

impl CommunityImpactRule for NeutralCommunityImpact {
    fn impact(&self, _plot: &PlotSnapshot, _application: &Application) -> f64 {
        0.5
    }
}

/// Suitability total with the per-factor trail that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityBreakdown {
    pub score: f64,
    pub components: Vec<ScoreComponent>,
}

impl SuitabilityBreakdown {
    pub fn points_for(&self, factor: ScoreFactor) -> f64 {
        self.components
            .iter()
            .filter(|component| component.factor == factor)
            .map(|component| component.points)
            .sum()
    }
}

pub fn score_suitability(
    plot: &PlotSnapshot,
    application: &Application,
    rule: &dyn CommunityImpactRule,
) -> SuitabilityBreakdown {
    let mut components = Vec::with_capacity(4);

    let env = &plot.environment;
    let environmental = (env.water_access * 0.4
        + env.soil_quality * 0.3
        + (1.0 - env.flood_risk) * 0.2
        + env.climate_resilience * 0.1)
        * ENVIRONMENTAL_POINTS;
    components.push(ScoreComponent {
        factor: ScoreFactor::Environmental,
        points: round_score(environmental),
        notes: format!(
            "water {:.2}, soil {:.2}, flood risk {:.2}, resilience {:.2}",
            env.water_access, env.soil_quality, env.flood_risk, env.climate_resilience
        ),
    });

    let attributes = &plot.attributes;
    let access = [
        (attributes.road_access, 0.4, "road"),
        (attributes.utilities, 0.3, "utilities"),
        (attributes.public_transport, 0.2, "public transport"),
        (attributes.community_facilities, 0.1, "community facilities"),
    ];
    let infrastructure = access
        .iter()
        .filter(|(present, _, _)| *present)
        .map(|(_, share, _)| share * INFRASTRUCTURE_POINTS)
        .sum::<f64>();
    let available: Vec<&str> = access
        .iter()
        .filter(|(present, _, _)| *present)
        .map(|(_, _, label)| *label)
        .collect();
    components.push(ScoreComponent {
        factor: ScoreFactor::Infrastructure,
        points: round_score(infrastructure),
        notes: if available.is_empty() {
            "no serviced infrastructure".to_string()
        } else {
            format!("access to {}", available.join(", "))
        },
    });

    let zoning_match = attributes.zoning.is_some() && attributes.zoning == application.intended_use;
    let zoning = if zoning_match { ZONING_POINTS } else { 0.0 };
    components.push(ScoreComponent {
        factor: ScoreFactor::Zoning,
        points: zoning,
        notes: match (attributes.zoning, application.intended_use) {
            (Some(zone), Some(_)) if zoning_match => format!("zoned {} as requested", zone.label()),
            (Some(zone), Some(intended)) => {
                format!("zoned {} but {} requested", zone.label(), intended.label())
            }
            _ => "zoning or intended use not declared".to_string(),
        },
    });

    let impact = rule.impact(plot, application);
    let impact = if impact.is_finite() {
        impact.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let community = impact * COMMUNITY_IMPACT_POINTS;
    components.push(ScoreComponent {
        factor: ScoreFactor::CommunityImpact,
        points: round_score(community),
        notes: format!("community impact rated {:.2}", impact),
    });

    let score = clamp_score(environmental + infrastructure + zoning + community);

    SuitabilityBreakdown { score, components }
}
