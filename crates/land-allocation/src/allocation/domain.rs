use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for allocatable parcels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlotId(pub String);

/// Identifier wrapper for submitted land applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier for a single optimization run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl fmt::Display for PlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plot handed to the optimizer. Attributes are fetched fresh from providers per evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plot {
    pub id: PlotId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Plot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PlotId(id.into()),
            label: None,
        }
    }
}

/// Zoning categories shared by parcels and the intended use on applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandUse {
    Residential,
    Agricultural,
    Commercial,
    Industrial,
    MixedUse,
    Conservation,
    Institutional,
}

impl LandUse {
    pub const fn label(self) -> &'static str {
        match self {
            LandUse::Residential => "residential",
            LandUse::Agricultural => "agricultural",
            LandUse::Commercial => "commercial",
            LandUse::Industrial => "industrial",
            LandUse::MixedUse => "mixed_use",
            LandUse::Conservation => "conservation",
            LandUse::Institutional => "institutional",
        }
    }
}

/// Environmental readings for a parcel, each nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalFactors {
    pub water_access: f64,
    pub soil_quality: f64,
    pub flood_risk: f64,
    pub climate_resilience: f64,
}

impl EnvironmentalFactors {
    pub(crate) fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("water_access", self.water_access),
            ("soil_quality", self.soil_quality),
            ("flood_risk", self.flood_risk),
            ("climate_resilience", self.climate_resilience),
        ]
    }
}

/// Parcel geometry as supplied by the spatial provider. Never inspected here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Geometry(pub serde_json::Value);

/// Zoning and infrastructure attributes reported by the spatial provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotAttributes {
    #[serde(default)]
    pub zoning: Option<LandUse>,
    #[serde(default)]
    pub road_access: bool,
    #[serde(default)]
    pub utilities: bool,
    #[serde(default)]
    pub public_transport: bool,
    #[serde(default)]
    pub community_facilities: bool,
    #[serde(default)]
    pub geometry: Geometry,
}

/// Immutable view of a parcel as it looked when an evaluation ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSnapshot {
    pub id: PlotId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub attributes: PlotAttributes,
    pub environment: EnvironmentalFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeLevel {
    Low,
    Middle,
    High,
}

/// Demographic attributes consumed by the equity rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub income_level: Option<IncomeLevel>,
    #[serde(default)]
    pub is_tribesman: bool,
    #[serde(default)]
    pub has_disability: bool,
    #[serde(default)]
    pub age: Option<u8>,
}

/// Request by an applicant for a plot of a given use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: Applicant,
    #[serde(default)]
    pub intended_use: Option<LandUse>,
    #[serde(default)]
    pub acknowledges_customary_rights: bool,
}

/// Committed pairing produced by an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub plot: PlotSnapshot,
    pub application: Application,
    pub combined_score: f64,
    pub suitability_score: f64,
    pub equity_score: f64,
    pub evaluated_at: DateTime<Utc>,
}
