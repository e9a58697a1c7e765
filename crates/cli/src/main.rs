//! rvnmet CLI - gap-filling of meteorological station data

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rvnmet_algorithms::interpolation::{
    infill, IdwParams, InfillParams, MissingDataWarning, DEFAULT_VARIABLES,
};
use rvnmet_core::io::{read_observations_csv, write_observations_csv};
use rvnmet_core::{ObservationTable, Projection, DEFAULT_EPSG};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rvnmet")]
#[command(author, version, about = "Meteorological station infilling", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill missing station values by inverse distance weighting
    Infill {
        /// Input CSV (station_name, date, lon, lat, variables...)
        input: PathBuf,
        /// Output CSV
        output: PathBuf,
        /// Variables to infill, comma separated
        #[arg(long, value_delimiter = ',', default_values_t = default_variables())]
        variables: Vec<String>,
        /// Only infill and output these stations, comma separated
        #[arg(short, long, value_delimiter = ',')]
        key_stations: Option<Vec<String>>,
        /// Planar projection for distances, e.g. 26917 or EPSG:32617
        #[arg(long, default_value_t = DEFAULT_EPSG.to_string())]
        epsg: String,
        /// IDW power parameter
        #[arg(short, long, default_value = "2.0")]
        power: f64,
        /// Ignore donors farther than this (projection units)
        #[arg(long)]
        max_radius: Option<f64>,
        /// Use at most this many nearest donors
        #[arg(long)]
        max_donors: Option<usize>,
        /// Write cells left missing to this CSV
        #[arg(short, long)]
        warnings: Option<PathBuf>,
    },
    /// Show stations, date range and missing counts of a CSV
    Summary {
        /// Input CSV
        input: PathBuf,
        /// Variables to count, comma separated
        #[arg(long, value_delimiter = ',', default_values_t = default_variables())]
        variables: Vec<String>,
    },
}

fn default_variables() -> Vec<String> {
    DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_table(path: &Path) -> Result<ObservationTable> {
    let pb = spinner("Reading observations...");
    let table = read_observations_csv(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!(
        "Input: {} rows, {} stations",
        table.n_rows(),
        table.unique_stations().len()
    );
    Ok(table)
}

fn write_table(table: &ObservationTable, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_observations_csv(table, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

/// Header of the warnings report, matching the fields of [`MissingDataWarning`]
const WARNINGS_HEADER: [&str; 3] = ["station", "date", "variable"];

fn write_warnings(warnings: &[MissingDataWarning], path: &Path) -> Result<()> {
    // serde only emits a header with the first record, so an empty report needs it written here
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(WARNINGS_HEADER)?;
    for w in warnings {
        writer.serialize(w)?;
    }
    writer.flush()?;
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run_infill(
    input: &Path,
    output: &Path,
    variables: Vec<String>,
    key_stations: Option<Vec<String>>,
    epsg: &str,
    power: f64,
    max_radius: Option<f64>,
    max_donors: Option<usize>,
    warnings_path: Option<&Path>,
) -> Result<()> {
    let projection: Projection = epsg.parse().context("Invalid --epsg")?;
    let table = read_table(input)?;

    let params = InfillParams {
        variables,
        key_stations,
        projection: projection.epsg(),
        idw: IdwParams {
            power,
            max_radius,
            max_donors,
            ..Default::default()
        },
    };

    let start = Instant::now();
    let pb = spinner("Infilling...");
    let result = infill(&table, &params).context("Infilling failed")?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    for s in &result.stats {
        println!(
            "  {:<16} missing {:>7}  filled {:>7}  left {:>7}",
            s.variable, s.missing, s.filled, s.unfilled
        );
    }
    if !result.is_complete() {
        warn!(
            "{} cell(s) had no donor; re-run on the output or add stations to fill them",
            result.warnings.len()
        );
    }

    write_table(&result.table, output)?;
    if let Some(path) = warnings_path {
        write_warnings(&result.warnings, path)?;
        println!("Warnings saved to: {}", path.display());
    }
    done("Infilled table", output, elapsed);
    Ok(())
}

fn run_summary(input: &Path, variables: &[String]) -> Result<()> {
    let table = read_table(input)?;

    println!("File: {}", input.display());
    println!("  Rows: {}", table.n_rows());
    println!("  Stations: {}", table.unique_stations().len());
    if let Some((first, last)) = table.date_range() {
        println!("  Dates: {} to {}", first, last);
    }
    for variable in variables {
        match table.missing_count(variable) {
            Ok(missing) => println!("  {:<16} missing {:>7}", variable, missing),
            Err(e) => println!("  {:<16} {}", variable, e),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Infill {
            input,
            output,
            variables,
            key_stations,
            epsg,
            power,
            max_radius,
            max_donors,
            warnings,
        } => run_infill(
            &input,
            &output,
            variables,
            key_stations,
            &epsg,
            power,
            max_radius,
            max_donors,
            warnings.as_deref(),
        ),
        Commands::Summary { input, variables } => run_summary(&input, &variables),
    }
}
