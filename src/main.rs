//! Page Inspector main entry point
//!
//! This is the command-line interface for the Page Inspector single-page analyzer.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use page_inspector::config::{load_config, Config};
use page_inspector::output::{format_report, write_markdown_report};
use page_inspector::storage::{self, JobStore, MemoryStore, ResultSink, SqliteStore};
use page_inspector::{Engine, JobStatus};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Page Inspector: single-page structure and link analysis
///
/// Fetches one page, reports its title, HTML version, heading distribution,
/// internal/external link counts and login form presence, and lists the
/// links that do not resolve.
#[derive(Parser, Debug)]
#[command(name = "page-inspector")]
#[command(version)]
#[command(about = "Single-page structure and link analysis", long_about = None)]
struct Cli {
    /// Absolute http(s) URL of the page to analyze
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Job identifier (defaults to a timestamp-based id)
    #[arg(long, value_name = "ID")]
    job_id: Option<String>,

    /// SQLite database for job results (overrides the config file)
    #[arg(long, value_name = "PATH", conflicts_with = "in_memory")]
    database: Option<PathBuf>,

    /// Keep job results in memory only
    #[arg(long)]
    in_memory: bool,

    /// Also write a markdown report to this file
    #[arg(long, value_name = "FILE.md")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    let (sink, store) = select_store(&cli, &config)?;
    let engine = Engine::from_config(&config, sink).context("failed to build HTTP clients")?;

    let job_id = cli
        .job_id
        .clone()
        .unwrap_or_else(|| format!("job-{}", Utc::now().format("%Y%m%d%H%M%S")));

    let run = engine
        .start_analysis(&job_id, &cli.url)
        .with_context(|| format!("cannot start analysis of {}", cli.url))?;

    let wait = run.wait();
    tokio::pin!(wait);

    let status = tokio::select! {
        status = &mut wait => status,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping job {}", job_id);
            engine.stop_analysis(&job_id);
            wait.await
        }
    };

    let record = store
        .get_job(&job_id)
        .with_context(|| format!("failed to load result of job {}", job_id))?;

    if !cli.quiet {
        print!("{}", format_report(&record));
    }

    if let Some(path) = &cli.report {
        write_markdown_report(&record, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if status == JobStatus::Error {
        tracing::error!(
            "Job {} failed: {}",
            job_id,
            record.error_message.as_deref().unwrap_or("unknown error")
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_inspector=info,warn"),
            1 => EnvFilter::new("page_inspector=debug,info"),
            2 => EnvFilter::new("page_inspector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens the store selected on the command line
fn select_store(
    cli: &Cli,
    config: &Config,
) -> anyhow::Result<(Arc<dyn ResultSink>, Arc<dyn JobStore>)> {
    if cli.in_memory {
        let store = Arc::new(MemoryStore::new());
        let sink: Arc<dyn ResultSink> = store.clone();
        let jobs: Arc<dyn JobStore> = store;
        return Ok((sink, jobs));
    }

    let path = cli
        .database
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.database_path));

    let store = Arc::new(open_database(&path)?);
    let sink: Arc<dyn ResultSink> = store.clone();
    let jobs: Arc<dyn JobStore> = store;
    Ok((sink, jobs))
}

fn open_database(path: &Path) -> anyhow::Result<SqliteStore> {
    tracing::debug!("Database: {}", path.display());
    storage::open_store(path)
        .with_context(|| format!("failed to open database {}", path.display()))
}
