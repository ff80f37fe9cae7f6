use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::convert::{convert_file, ConvertSummary};
use crate::data::lookup::LookupTables;
use crate::logging;
use crate::resolve::{NameResolver, ResolvedName, UsageContext};
use crate::stats::run_build_stats;

#[derive(Debug, Parser)]
#[command(name = "starforge", about = "Tournament fleet list converter", version)]
pub struct Cli {
    /// YAML settings file (defaults to ./starforge.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write every debug event to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    #[arg(long)]
    pub aliases: Option<PathBuf>,
    #[arg(long)]
    pub nicknames: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a tournament export (CSV or workbook) into canonical fleet rows.
    Convert {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        lookup: LookupArgs,
        /// Worker threads; 0 uses every core.
        #[arg(long)]
        workers: Option<usize>,
        /// Do not record the output in the dataset registry.
        #[arg(long)]
        no_registry: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Extract ship builds and squadron counts from a converted fleet file.
    Builds {
        input: PathBuf,
        /// Output directory (defaults to the input's directory).
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Output file tag (defaults to the input file stem).
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Resolve one card name in a usage context.
    Resolve {
        context: UsageContext,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        #[command(flatten)]
        lookup: LookupArgs,
        #[arg(long)]
        json: bool,
    },
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }
    if let Some(path) = cli.log_file {
        settings.log_file = Some(path);
    }
    if let Err(err) = logging::init(&settings.log_level, settings.log_file.as_deref()) {
        eprintln!("failed to open log file: {err}");
        return 1;
    }

    match cli.command {
        Command::Convert {
            input,
            output,
            lookup,
            workers,
            no_registry,
            json,
        } => {
            if let Some(input) = input {
                settings.input_path = input;
            }
            if let Some(output) = output {
                settings.output_path = output;
            }
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if no_registry {
                settings.registry_path = None;
            }
            apply_lookup_args(&mut settings, lookup);
            handle_convert(&settings, json)
        }
        Command::Builds {
            input,
            out_dir,
            tag,
            json,
        } => handle_builds(&settings, &input, out_dir.as_deref(), tag.as_deref(), json),
        Command::Resolve {
            context,
            name,
            lookup,
            json,
        } => {
            apply_lookup_args(&mut settings, lookup);
            handle_resolve(&settings, context, &name.join(" "), json)
        }
    }
}

fn apply_lookup_args(settings: &mut Settings, lookup: LookupArgs) {
    if let Some(path) = lookup.aliases {
        settings.aliases_path = path;
    }
    if let Some(path) = lookup.nicknames {
        settings.nicknames_path = path;
    }
}

fn load_tables(settings: &Settings) -> Option<LookupTables> {
    match LookupTables::load(&settings.aliases_path, &settings.nicknames_path) {
        Ok(tables) => Some(tables),
        Err(err) => {
            eprintln!("lookup load failed: {err}");
            None
        }
    }
}

fn handle_convert(settings: &Settings, as_json: bool) -> i32 {
    let Some(tables) = load_tables(settings) else {
        return 1;
    };
    match convert_file(&settings.convert_options(), &tables) {
        Ok(summary) => print_payload(&summary, as_json, render_summary),
        Err(err) => {
            eprintln!("conversion failed: {err}");
            1
        }
    }
}

fn render_summary(summary: &ConvertSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "rows read:            {}", summary.rows_read);
    let _ = writeln!(out, "rows skipped:         {}", summary.rows_skipped);
    let _ = writeln!(out, "rows written:         {}", summary.rows_written);
    let _ = writeln!(out, "rows with unresolved: {}", summary.rows_with_unresolved);
    let _ = writeln!(out, "alignment anomalies:  {}", summary.alignment_anomalies);
    let _ = write!(out, "points mismatches:    {}", summary.points_mismatches);
    if let Some(path) = &summary.output_path {
        let _ = write!(out, "\noutput:               {path}");
    }
    out
}

fn handle_builds(
    settings: &Settings,
    input: &Path,
    out_dir: Option<&Path>,
    tag: Option<&str>,
    as_json: bool,
) -> i32 {
    let out_dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    match run_build_stats(input, &out_dir, tag, settings.registry_path.as_deref()) {
        Ok(summary) => print_payload(&summary, as_json, |summary| {
            format!(
                "builds complete: tag={}, fleets={}, builds={}, ships={}, out={}",
                summary.tag,
                summary.fleets,
                summary.builds,
                summary.ships,
                out_dir.display()
            )
        }),
        Err(err) => {
            eprintln!("build extraction failed: {err}");
            1
        }
    }
}

fn handle_resolve(settings: &Settings, context: UsageContext, name: &str, as_json: bool) -> i32 {
    let Some(tables) = load_tables(settings) else {
        return 1;
    };
    let resolved = NameResolver::new(&tables).resolve(name, context);
    print_payload(&resolved, as_json, |resolved| match resolved {
        ResolvedName::Matched {
            display,
            canonical_id,
            points,
            stage,
        } => {
            let points = points.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            format!("{display}\tid={canonical_id}\tpoints={points}\tstage={stage}")
        }
        ResolvedName::Unresolved { .. } => resolved.display_text(),
    })
}

fn print_payload<T, F>(payload: &T, as_json: bool, render: F) -> i32
where
    T: serde::Serialize,
    F: Fn(&T) -> String,
{
    if !as_json {
        println!("{}", render(payload));
        return 0;
    }
    match serde_json::to_string_pretty(payload) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize result: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn missing_subcommand_is_a_usage_error() {
        assert_eq!(run_with_args(&args(&["starforge"])), 2);
    }

    #[test]
    fn bad_context_is_a_usage_error() {
        assert_eq!(run_with_args(&args(&["starforge", "resolve", "hull", "ISD"])), 2);
    }

    #[test]
    fn parses_resolve_with_multiword_name() {
        let cli = Cli::try_parse_from(args(&["starforge", "resolve", "flagship-upgrade", "Darth", "Vader"]))
            .unwrap();
        match cli.command {
            Command::Resolve { context, name, .. } => {
                assert_eq!(context, UsageContext::FlagshipUpgrade);
                assert_eq!(name.join(" "), "Darth Vader");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn summary_text_lists_every_counter() {
        let text = render_summary(&ConvertSummary {
            rows_read: 5,
            rows_skipped: 1,
            rows_written: 4,
            ..ConvertSummary::default()
        });
        assert!(text.contains("rows read:            5"));
        assert!(text.contains("rows skipped:         1"));
        assert!(text.contains("points mismatches:    0"));
        assert!(!text.contains("output:"));
    }
}
