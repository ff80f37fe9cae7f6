//! Aggregates builds across a converted fleet file and writes the secondary outputs:
//! upgrade frequencies, raw builds and squadron counts per faction, each as JSON and CSV.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::data::registry;
use crate::error::{Result, StarforgeError};
use crate::stats::builds::{extract_builds, extract_squadrons, ShipBuild};

/// ship name -> upgrade -> count
pub type BuildFrequencies = BTreeMap<String, BTreeMap<String, usize>>;
/// faction -> squadron name -> count
pub type SquadronCounts = BTreeMap<String, BTreeMap<String, usize>>;

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub builds: Vec<ShipBuild>,
    pub frequencies: BuildFrequencies,
    pub squadrons: SquadronCounts,
    pub fleets: usize,
}

impl BuildStats {
    pub fn add_fleet(&mut self, faction: &str, fleet_text: &str) {
        self.fleets += 1;
        for build in extract_builds(fleet_text) {
            let per_ship = self.frequencies.entry(build.ship_name.clone()).or_default();
            for upgrade in &build.upgrades {
                *per_ship.entry(upgrade.clone()).or_insert(0) += 1;
            }
            self.builds.push(build);
        }
        let squadrons = extract_squadrons(fleet_text);
        if squadrons.is_empty() {
            return;
        }
        let per_faction = self.squadrons.entry(faction.to_string()).or_default();
        for squadron in squadrons {
            *per_faction.entry(squadron).or_insert(0) += 1;
        }
    }
}

/// Output file locations for one source tag.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPaths {
    pub frequencies_json: PathBuf,
    pub frequencies_csv: PathBuf,
    pub raw_builds_json: PathBuf,
    pub raw_builds_csv: PathBuf,
    pub squadrons_json: PathBuf,
    pub squadrons_csv: PathBuf,
}

impl ReportPaths {
    pub fn new(out_dir: &Path, tag: &str) -> Self {
        let file = |stem: &str, ext: &str| out_dir.join(format!("{stem}_{tag}.{ext}"));
        Self {
            frequencies_json: file("ship_upgrade_frequencies", "json"),
            frequencies_csv: file("ship_upgrade_frequencies", "csv"),
            raw_builds_json: file("raw_ship_builds", "json"),
            raw_builds_csv: file("raw_ship_builds", "csv"),
            squadrons_json: file("squadron_faction_counts", "json"),
            squadrons_csv: file("squadron_faction_counts", "csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildStatsSummary {
    pub tag: String,
    pub fleets: usize,
    pub builds: usize,
    pub ships: usize,
    pub factions_with_squadrons: usize,
    pub outputs: ReportPaths,
}

/// Source tag from the input file stem: `converted-fleets.csv` -> `converted-fleets`.
pub fn source_tag(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("fleets")
        .to_string()
}

/// Read `faction` and `fleet_data` from every row of a converted fleet file.
pub fn load_stats(input: &Path) -> Result<BuildStats> {
    let read_err = |source| StarforgeError::TournamentRead {
        path: input.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)
        .map_err(read_err)?;
    let headers = reader.headers().map_err(read_err)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| StarforgeError::ConvertedColumn {
                path: input.display().to_string(),
                column: name,
            })
    };
    let fleet_data = column("fleet_data")?;
    let faction = column("faction")?;

    let mut stats = BuildStats::default();
    for record in reader.records() {
        let record = record.map_err(read_err)?;
        let Some(text) = record.get(fleet_data) else {
            continue;
        };
        stats.add_fleet(record.get(faction).unwrap_or(""), text);
    }
    Ok(stats)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn write_csv<I, R>(path: &Path, header: [&str; 3], rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let write_err = |source| StarforgeError::Write {
        path: path.display().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(header).map_err(write_err)?;
    for row in rows {
        writer.write_record(row).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_reports(stats: &BuildStats, paths: &ReportPaths) -> Result<()> {
    write_json(&paths.frequencies_json, &stats.frequencies)?;
    write_csv(
        &paths.frequencies_csv,
        ["ship_name", "upgrade_name", "frequency"],
        stats.frequencies.iter().flat_map(|(ship, upgrades)| {
            upgrades
                .iter()
                .map(move |(upgrade, count)| [ship.clone(), upgrade.clone(), count.to_string()])
        }),
    )?;

    write_json(&paths.raw_builds_json, &stats.builds)?;
    write_csv(
        &paths.raw_builds_csv,
        ["build_id", "ship_name", "upgrade_name"],
        stats
            .builds
            .iter()
            .filter(|build| !build.upgrades.is_empty())
            .enumerate()
            .flat_map(|(index, build)| {
                build.upgrades.iter().map(move |upgrade| {
                    [(index + 1).to_string(), build.ship_name.clone(), upgrade.clone()]
                })
            }),
    )?;

    write_json(&paths.squadrons_json, &stats.squadrons)?;
    write_csv(
        &paths.squadrons_csv,
        ["faction", "squadron_name", "total_count"],
        stats.squadrons.iter().flat_map(|(faction, squadrons)| {
            squadrons
                .iter()
                .map(move |(name, count)| [faction.clone(), name.clone(), count.to_string()])
        }),
    )?;
    Ok(())
}

/// Extract, aggregate and write every secondary output for one converted file.
pub fn run_build_stats(
    input: &Path,
    out_dir: &Path,
    tag: Option<&str>,
    registry_path: Option<&Path>,
) -> Result<BuildStatsSummary> {
    let tag = tag.map(str::to_string).unwrap_or_else(|| source_tag(input));
    info!(input = %input.display(), tag = %tag, "extracting ship builds");
    let stats = load_stats(input)?;
    if stats.builds.is_empty() && stats.fleets > 0 {
        warn!(fleets = stats.fleets, "fleet text parsed but no ship builds extracted");
    }

    fs::create_dir_all(out_dir)?;
    let paths = ReportPaths::new(out_dir, &tag);
    write_reports(&stats, &paths)?;

    if let Some(registry_path) = registry_path {
        if let Err(err) = registry::record_dataset(
            registry_path,
            &format!("ship_upgrade_frequencies_{tag}"),
            input,
            &paths.frequencies_json,
            stats.builds.len(),
        ) {
            warn!(error = %err, "failed to update dataset registry");
        }
    }

    let summary = BuildStatsSummary {
        tag,
        fleets: stats.fleets,
        builds: stats.builds.len(),
        ships: stats.frequencies.len(),
        factions_with_squadrons: stats.squadrons.len(),
        outputs: paths,
    };
    info!(
        fleets = summary.fleets,
        builds = summary.builds,
        ships = summary.ships,
        "build statistics written"
    );
    Ok(summary)
}
