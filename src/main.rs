use anyhow::{Context, Result};
use clap::Parser;
use crimeprep::pipeline::{
    run_pipeline, PipelineConfig, DEFAULT_BATCH_SIZE, DEFAULT_DISTRICTS_FILE, DEFAULT_IUCR_FILE,
    DEFAULT_OUTPUT, DEFAULT_RETENTION_YEARS,
};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Preprocess the Chicago crimes CSV", long_about = None)]
struct Cli {
    /// Path to the raw crimes CSV
    input: PathBuf,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    out: PathBuf,

    /// Rows per batch
    #[arg(long, visible_alias = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    chunksize: usize,

    /// District reference table
    #[arg(long, default_value = DEFAULT_DISTRICTS_FILE)]
    districts: PathBuf,

    /// IUCR classification-code reference table
    #[arg(long, default_value = DEFAULT_IUCR_FILE)]
    iucr: PathBuf,

    /// Keep records no older than this many years
    #[arg(long, default_value_t = DEFAULT_RETENTION_YEARS)]
    retention_years: u32,
}

impl From<Cli> for PipelineConfig {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            output: cli.out,
            batch_size: cli.chunksize,
            districts_file: cli.districts,
            iucr_file: cli.iucr,
            retention_years: cli.retention_years,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from(Cli::parse());
    config.validate()?;

    if !config
        .input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    {
        warn!(input = %config.input.display(), "Input does not have a .csv extension");
    }

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let summary = run_pipeline(&config)
        .with_context(|| format!("processing {}", config.input.display()))?;
    info!(
        rows = summary.rows_written,
        output = %config.output.display(),
        "Done"
    );

    Ok(())
}
