//! Binary entry point for the geodex batch indexer.
#![forbid(unsafe_code)]

#[path = "geodex/ui.rs"]
mod ui;

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use geodex::{
    cli::{config::CliConfig, import::import_file, runner::ScriptRunner},
    coord, logging, GisDb, GisOptions, Rect,
};
use serde::Serialize;
use tracing::info;
use ui::{Theme, Ui};

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(
    name = "geodex",
    version,
    about = "Index GNIS feature records by name and location",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    index: IndexArgs,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "GEODEX_CONFIG",
        help = "Config file (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        env = "GEODEX_LOG",
        help = "Diagnostic log filter, e.g. `info` or `geodex::index=debug`"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for the final report"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, global = true, help = "Suppress decoration in text output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct IndexArgs {
    #[arg(long, global = true, help = "Initial name index slot count")]
    hash_slots: Option<usize>,

    #[arg(long, global = true, help = "Name index load factor that triggers a rehash")]
    load_limit: Option<f64>,

    #[arg(long, global = true, help = "Quadtree leaf capacity")]
    bucket_capacity: Option<usize>,

    #[arg(long, global = true, help = "Buffer pool capacity (records)")]
    pool_capacity: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Execute a command script and write the command log")]
    Run {
        #[arg(value_name = "DB")]
        db_path: PathBuf,
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(value_name = "LOG")]
        log: PathBuf,
    },
    #[command(about = "Import one GNIS file and print index statistics")]
    Import {
        #[arg(value_name = "DB")]
        db_path: PathBuf,
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(
            long,
            num_args = 4,
            required = true,
            value_names = ["WEST", "EAST", "SOUTH", "NORTH"],
            help = "World boundaries as DMS longitudes and latitudes"
        )]
        world: Vec<String>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: geodex::cli::runner::RunSummary,
    log: &'a std::path::Path,
    elapsed_ms: u128,
    stats: geodex::db::GisStats,
}

#[derive(Serialize)]
struct ImportReport {
    summary: geodex::cli::import::ImportSummary,
    elapsed_ms: u128,
    stats: geodex::db::GisStats,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    logging::init_logging(level)?;
    if let Some(path) = config.path() {
        info!(path = %path.display(), "cli.config.loaded");
    }

    let options = build_options(&cli.index, config.options()?);
    let ui = Ui::new(cli.theme, cli.quiet);

    match &cli.command {
        Command::Run {
            db_path,
            script,
            log,
        } => {
            let start = Instant::now();
            let mut db = GisDb::create(db_path, options)?;
            let writer = BufWriter::new(File::create(log)?);
            let mut runner = ScriptRunner::new(&mut db, writer);
            let summary = runner.run_file(script)?;
            drop(runner);
            let elapsed = start.elapsed();
            let report = RunReport {
                summary,
                log,
                elapsed_ms: elapsed.as_millis(),
                stats: db.stats(),
            };
            emit(cli.format, &report, || ui.run_summary(&summary, log, elapsed))?;
        }
        Command::Import {
            db_path,
            file,
            world,
        } => {
            let world = parse_world(world)?;
            let mut db = GisDb::create(db_path, options)?;
            db.set_world(world)?;
            let task = ui.task(format!("importing {}", file.display()));
            let summary = import_file(&mut db, file)?;
            let elapsed = task.finish();
            let stats = db.stats();
            let report = ImportReport {
                summary,
                elapsed_ms: elapsed.as_millis(),
                stats: stats.clone(),
            };
            emit(cli.format, &report, || {
                ui.import_summary(file, &summary, elapsed);
                ui.index_stats(&stats);
            })?;
        }
    }
    Ok(())
}

/// Layers command-line overrides on top of the configured options.
fn build_options(args: &IndexArgs, mut options: GisOptions) -> GisOptions {
    if let Some(slots) = args.hash_slots {
        options.hash_slots = slots;
    }
    if let Some(limit) = args.load_limit {
        options.load_limit = limit;
    }
    if let Some(capacity) = args.bucket_capacity {
        options.bucket_capacity = capacity;
    }
    if let Some(capacity) = args.pool_capacity {
        options.pool_capacity = capacity;
    }
    options
}

fn parse_world(values: &[String]) -> Result<Rect, Box<dyn Error>> {
    let [west, east, south, north] = values else {
        return Err("--world takes exactly four values".into());
    };
    let world = Rect::new(
        coord::parse_longitude(west)?,
        coord::parse_longitude(east)?,
        coord::parse_latitude(south)?,
        coord::parse_latitude(north)?,
    );
    if !world.is_well_formed() {
        return Err(format!("world boundaries {world} are inverted").into());
    }
    Ok(world)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}
