//! Land allocation engine: scores plots against applications, surfaces
//! spatial and legal conflicts, and greedily assigns plots to applicants.

pub mod allocation;
pub mod config;
pub mod error;
pub mod telemetry;
