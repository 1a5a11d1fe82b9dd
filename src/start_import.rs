//! Startup helpers for the import command line.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use crate::catalog::{ImportConfig, ImportEngine, JobReport, open_database};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "DOCTREE_IMPORT_CONFIG";
/// Environment variable overriding the database path.
pub const DB_ENV: &str = "DOCTREE_IMPORT_DB";
/// Configuration file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "import.json";

/// Install the global tracing subscriber (`RUST_LOG` aware, `info` default).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Load configuration from the environment-selected file, applying the
/// database override.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config() -> anyhow::Result<ImportConfig> {
    let path = std::env::var_os(CONFIG_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let mut config = ImportConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    if let Some(db) = std::env::var_os(DB_ENV) {
        config.storage.sqlite_path = PathBuf::from(db);
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Run one named job end to end: config, database, transaction, report.
///
/// # Errors
/// Returns an error if configuration, database access or the job fails.
pub fn run_job(job: &str) -> anyhow::Result<JobReport> {
    let config = load_config()?;
    tracing::info!("Starting doctree-import v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.storage.sqlite_path.display());

    let mut conn = open_database(&config.storage.sqlite_path)
        .with_context(|| format!("failed to open {}", config.storage.sqlite_path.display()))?;
    let engine = ImportEngine::new(config)?;
    let report = engine
        .run_job(&mut conn, job)
        .with_context(|| format!("job '{job}' failed"))?;
    Ok(report)
}

/// Command-line entry: initialize logging, run the job named by the first
/// argument and print the summary and resulting tree.
///
/// # Returns
/// `ExitCode::SUCCESS` when the job committed, `1` on usage or job failure.
#[must_use]
#[allow(clippy::print_stdout)]
pub fn run() -> ExitCode {
    init_tracing();

    let Some(job) = std::env::args().nth(1) else {
        tracing::error!("usage: doctree-import <job>");
        return ExitCode::from(1);
    };

    match run_job(&job) {
        Ok(report) => {
            println!("{}", report.summary);
            println!();
            println!("{} hierarchy:", report.hierarchy);
            print!("{}", report.tree);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
