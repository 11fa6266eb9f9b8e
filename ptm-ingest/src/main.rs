//! ptm-ingest - Import and reconciliation tool
//!
//! Normalizes legacy export files and resolves client and technician names
//! to the identifiers used by the scheduling system. Logs go to stderr;
//! data goes to stdout or the requested output file.
//!
//! Exit status is non-zero only for I/O or configuration errors. Values that
//! cannot be normalized or matched are reported, not fatal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ptm_common::config::{ConfigResolver, TomlConfig};
use ptm_common::TechnicianRoster;
use ptm_ingest::import::{
    join_csv, load_candidate_pool, load_column, normalize_csv, reconcile_names,
    resolve_technician, write_import_report, write_normalized_csv, ImportOptions,
};
use ptm_ingest::Reconciler;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for ptm-ingest
#[derive(Parser, Debug)]
#[command(name = "ptm-ingest")]
#[command(about = "Normalize legacy exports and reconcile names across systems")]
#[command(version)]
struct Args {
    /// TOML config file (overrides PTM_CONFIG and the user config)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize client names, technicians, prices and dates of an import file
    Normalize {
        /// Delimited file to normalize
        #[arg(short, long)]
        input: PathBuf,

        /// Normalized output (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Year for dates written without one
        #[arg(long)]
        default_year: Option<i32>,

        /// Write the batch report as JSON to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Match names from one file against the records of another
    Reconcile {
        /// File holding the names to resolve
        #[arg(long)]
        targets: PathBuf,

        /// Column of the targets file holding the names
        #[arg(long, default_value = "client_name")]
        target_column: String,

        /// File holding the authoritative records
        #[arg(long)]
        pool: PathBuf,

        #[arg(long, default_value = "id")]
        id_column: String,

        #[arg(long, default_value = "name")]
        name_column: String,

        /// JSON lines output (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pair two export files row by row
    Join {
        #[arg(long)]
        left: PathBuf,

        #[arg(long)]
        right: PathBuf,

        /// Joined output (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up a technician token in the configured roster
    Technician {
        /// Free-text name or username, e.g. "Jean-Philippe"
        token: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Until the configured filter is installed, log to stderr at info
    let resolver = ConfigResolver::new(args.config.as_deref());
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::INFO)
        .finish();
    let (config, source) = tracing::subscriber::with_default(bootstrap, || resolver.load())
        .context("Failed to load configuration")?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level);

    info!(
        "Starting ptm-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    debug!("Configuration: {}", source);

    match args.command {
        Command::Normalize {
            input,
            output,
            default_year,
            report,
        } => run_normalize(&config, &input, output.as_deref(), default_year, report.as_deref()),
        Command::Reconcile {
            targets,
            target_column,
            pool,
            id_column,
            name_column,
            output,
        } => run_reconcile(
            &config,
            &targets,
            &target_column,
            &pool,
            &id_column,
            &name_column,
            output.as_deref(),
        ),
        Command::Join {
            left,
            right,
            output,
        } => run_join(&config, &left, &right, output.as_deref()),
        Command::Technician { token } => run_technician(&config, &token),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_normalize(
    config: &TomlConfig,
    input: &Path,
    output: Option<&Path>,
    default_year: Option<i32>,
    report_path: Option<&Path>,
) -> Result<()> {
    let roster = TechnicianRoster::from_config(&config.technicians);
    let mut options = ImportOptions::from_config(&config.import, roster)?;
    if default_year.is_some() {
        options.default_year = default_year;
    }

    let reader = open_input(input)?;
    let batch = normalize_csv(reader, &options)
        .with_context(|| format!("Failed to normalize {}", input.display()))?;

    write_normalized_csv(open_output(output)?, &batch.records, options.delimiter)?;

    info!("Report: {}", serde_json::to_string(&batch.report)?);
    if let Some(path) = report_path {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_import_report(file, &batch.report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn run_reconcile(
    config: &TomlConfig,
    targets_path: &Path,
    target_column: &str,
    pool_path: &Path,
    id_column: &str,
    name_column: &str,
    output: Option<&Path>,
) -> Result<()> {
    let delimiter = config.import.delimiter_byte()?;
    let reconciler = Reconciler::from_config(&config.matching)?;

    let pool = load_candidate_pool(open_input(pool_path)?, id_column, name_column, delimiter)
        .with_context(|| format!("Failed to load candidates from {}", pool_path.display()))?;
    if pool.is_empty() {
        warn!("Candidate pool is empty; nothing can match");
    }
    let targets = load_column(open_input(targets_path)?, target_column, delimiter)
        .with_context(|| format!("Failed to load targets from {}", targets_path.display()))?;

    let outcomes = reconcile_names(targets.iter().map(String::as_str), &pool, &reconciler);

    let mut out = open_output(output)?;
    for outcome in &outcomes {
        serde_json::to_writer(&mut out, outcome)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn run_join(config: &TomlConfig, left: &Path, right: &Path, output: Option<&Path>) -> Result<()> {
    let delimiter = config.import.delimiter_byte()?;
    let summary = join_csv(open_input(left)?, open_input(right)?, open_output(output)?, delimiter)?;
    if summary.left_unpaired + summary.right_unpaired > 0 {
        warn!(
            "{} row(s) had no counterpart and were written with blank fields",
            summary.left_unpaired + summary.right_unpaired
        );
    }
    Ok(())
}

fn run_technician(config: &TomlConfig, token: &str) -> Result<()> {
    let roster = TechnicianRoster::from_config(&config.technicians);
    let technician = resolve_technician(&roster, token);
    match technician {
        Some(t) if !t.active => warn!(token = %token, id = %t.id, "Technician is inactive"),
        Some(_) => {}
        None => warn!(token = %token, roster_size = roster.len(), "Technician not found"),
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, &technician)?;
    writeln!(out)?;
    Ok(())
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}
