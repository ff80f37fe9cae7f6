pub mod builds;
pub mod report;

pub use builds::{extract_builds, extract_squadrons, ShipBuild, MAX_UPGRADE_POINTS};
pub use report::{run_build_stats, BuildFrequencies, BuildStats, BuildStatsSummary, SquadronCounts};
