//! Batch conversion: tournament export in, converted fleet CSV out.
//!
//! Rows are independent; they are parsed, resolved and formatted on the worker pool, then
//! filtered by the skip policy and numbered in input order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data::lookup::LookupTables;
use crate::data::registry;
use crate::data::tournament::{self, RawTable};
use crate::error::{Result, StarforgeError};
use crate::fleet::{FleetFormatter, FleetRecord, FormattedFleet, HeaderSchema};
use crate::parallel::{map_in_batches, Progress, WorkerPool};
use crate::resolve::{NameResolver, ResolvedName};

pub const DEFAULT_OUTPUT_PATH: &str = "data/converted-fleets.csv";
pub const REGISTRY_DATASET: &str = "converted_fleets";

pub const OUTPUT_COLUMNS: [&str; 16] = [
    "id",
    "user_id",
    "fleet_data",
    "faction",
    "fleet_name",
    "created_at",
    "updated_at",
    "commander",
    "points",
    "date_added",
    "legends",
    "legacy",
    "old_legacy",
    "arc",
    "shared",
    "numerical_id",
];

/// One output row. Columns the converter has no source for stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FleetRow {
    pub id: String,
    pub user_id: String,
    pub fleet_data: String,
    pub faction: String,
    pub fleet_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub commander: String,
    pub points: String,
    pub date_added: String,
    pub legends: String,
    pub legacy: String,
    pub old_legacy: String,
    pub arc: String,
    pub shared: String,
    pub numerical_id: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_written: usize,
    pub rows_with_unresolved: usize,
    pub alignment_anomalies: usize,
    pub points_mismatches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    pub progress_step_percent: usize,
    pub registry_path: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(tournament::DEFAULT_TOURNAMENT_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            workers: 0,
            progress_step_percent: 5,
            registry_path: Some(PathBuf::from(registry::DEFAULT_REGISTRY_PATH)),
        }
    }
}

/// A fully processed input row.
#[derive(Debug, Clone)]
pub struct ConvertedRow {
    pub record: FleetRecord,
    pub fleet: FormattedFleet,
}

impl ConvertedRow {
    pub fn skipped(&self) -> bool {
        should_skip(&self.record, &self.fleet)
    }

    pub fn points_mismatch(&self) -> bool {
        self.record
            .totals
            .list_points()
            .is_some_and(|declared| declared != i64::from(self.fleet.computed_total))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub rows: Vec<FleetRow>,
    pub summary: ConvertSummary,
}

/// Drop a row only when it carries no signal at all: declared total exactly 0 and every
/// commander, objective, ship and squadron slot empty or unresolved.
pub fn should_skip(record: &FleetRecord, fleet: &FormattedFleet) -> bool {
    let blank = |slot: &Option<ResolvedName>| slot.as_ref().map_or(true, ResolvedName::is_unresolved);
    record.totals.list_points() == Some(0)
        && blank(&fleet.commander)
        && fleet.objectives.iter().all(blank)
        && fleet.ships.iter().all(|ship| ship.name.is_unresolved())
        && fleet.squadrons.iter().all(ResolvedName::is_unresolved)
}

pub fn convert_row(schema: &HeaderSchema, formatter: &FleetFormatter<'_>, values: &[String]) -> ConvertedRow {
    let record = schema.parse_row(values);
    let fleet = formatter.format(&record);
    ConvertedRow { record, fleet }
}

/// Convert an in-memory table. Fails only on a malformed header.
pub fn convert_table(
    table: &RawTable,
    tables: &LookupTables,
    pool: WorkerPool,
    progress_step_percent: usize,
) -> Result<Conversion> {
    let schema = HeaderSchema::from_headers(&table.headers)?;
    let formatter = FleetFormatter::new(NameResolver::new(tables));
    let mut progress = Progress::new("convert", table.rows.len(), progress_step_percent);
    let batches = progress.batches();

    let converted = pool.install(|| {
        map_in_batches(
            &table.rows,
            batches,
            |values| convert_row(&schema, &formatter, values),
            |done| {
                progress.update(done);
            },
        )
    });

    let mut conversion = Conversion {
        summary: ConvertSummary {
            rows_read: table.rows.len(),
            ..ConvertSummary::default()
        },
        ..Conversion::default()
    };
    for (index, row) in converted.into_iter().enumerate() {
        let line = index + 2;
        if row.skipped() {
            debug!(row = line, "skipping empty fleet");
            conversion.summary.rows_skipped += 1;
            continue;
        }
        if row.fleet.has_unresolved() {
            conversion.summary.rows_with_unresolved += 1;
        }
        conversion.summary.alignment_anomalies += row.record.anomalies.len();
        if row.points_mismatch() {
            debug!(
                row = line,
                declared = %row.record.totals.list,
                computed = row.fleet.computed_total,
                "declared total differs from computed total"
            );
            conversion.summary.points_mismatches += 1;
        }
        conversion.rows.push(FleetRow {
            fleet_data: row.fleet.text,
            faction: row.record.faction,
            fleet_name: row.record.fleet_name,
            commander: row.record.commander,
            points: row.record.totals.list,
            numerical_id: conversion.rows.len() + 1,
            ..FleetRow::default()
        });
    }
    conversion.summary.rows_written = conversion.rows.len();
    Ok(conversion)
}

/// Header is always written, even with no rows.
pub fn write_rows(path: &Path, rows: &[FleetRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let write_err = |source| StarforgeError::Write {
        path: path.display().to_string(),
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_err)?;
    writer.write_record(OUTPUT_COLUMNS).map_err(write_err)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read, convert, write, register. Lookup tables are loaded by the caller.
pub fn convert_file(options: &ConvertOptions, tables: &LookupTables) -> Result<ConvertSummary> {
    info!(input = %options.input.display(), "reading tournament export");
    let table = tournament::read_table(&options.input)?;
    let pool = WorkerPool::with_workers(options.workers);
    let conversion = convert_table(&table, tables, pool, options.progress_step_percent)?;

    write_rows(&options.output, &conversion.rows)?;
    let mut summary = conversion.summary;
    summary.output_path = Some(options.output.display().to_string());

    if let Some(registry_path) = &options.registry_path {
        if let Err(err) = registry::record_dataset(
            registry_path,
            REGISTRY_DATASET,
            &options.input,
            &options.output,
            summary.rows_written,
        ) {
            warn!(error = %err, "failed to update dataset registry");
        }
    }

    info!(
        rows_read = summary.rows_read,
        rows_skipped = summary.rows_skipped,
        rows_written = summary.rows_written,
        rows_with_unresolved = summary.rows_with_unresolved,
        alignment_anomalies = summary.alignment_anomalies,
        points_mismatches = summary.points_mismatches,
        output = %options.output.display(),
        "conversion finished"
    );
    Ok(summary)
}
