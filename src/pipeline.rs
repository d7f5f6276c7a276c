use crate::engine::cleaner::clean_batch_with_stats;
use crate::error::{PipelineError, Result};
use crate::record::Batch;
use crate::reference::{load_lookups, DistrictMapping};
use crate::sink::IncrementalSink;
use crate::source::BatchSource;

use chrono::{Local, Months, NaiveDateTime};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_BATCH_SIZE: usize = 200_000;
pub const DEFAULT_RETENTION_YEARS: u32 = 5;
pub const DEFAULT_OUTPUT: &str = "data/source.csv";
pub const DEFAULT_DISTRICTS_FILE: &str = "datapreprocessing/data/Police_Stations_20260202.csv";
pub const DEFAULT_IUCR_FILE: &str = "datapreprocessing/data/Chicago_Police_Department_-_Illinois_Uniform_Crime_Reporting_(IUCR)_Codes_20260202.csv";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub batch_size: usize,
    pub districts_file: PathBuf,
    pub iucr_file: PathBuf,
    pub retention_years: u32,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            districts_file: PathBuf::from(DEFAULT_DISTRICTS_FILE),
            iucr_file: PathBuf::from(DEFAULT_IUCR_FILE),
            retention_years: DEFAULT_RETENTION_YEARS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(PipelineError::MissingPrimaryInput(self.input.clone()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub cutoff: NaiveDateTime,
    pub batches_read: u64,
    pub batches_written: u64,
    pub rows_read: u64,
    pub rows_skipped: u64,
    pub rows_written: u64,
}

/// Earliest accepted record date: `now` minus `retention_years` calendar years.
pub fn compute_cutoff(now: NaiveDateTime, retention_years: u32) -> Result<NaiveDateTime> {
    retention_years
        .checked_mul(12)
        .and_then(|months| now.checked_sub_months(Months::new(months)))
        .ok_or(PipelineError::InvalidRetention(retention_years))
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineSummary> {
    run_pipeline_at(config, Local::now().naive_local())
}

/// Runs the whole pipeline with the cutoff derived from `now`.
pub fn run_pipeline_at(config: &PipelineConfig, now: NaiveDateTime) -> Result<PipelineSummary> {
    config.validate()?;

    let cutoff = compute_cutoff(now, config.retention_years)?;
    info!(cutoff = %cutoff.date(), "Filtering data since cutoff");

    let lookups = load_lookups(&config.districts_file, &config.iucr_file)?;

    info!(input = %config.input.display(), "Processing input");
    let mut source = BatchSource::open(&config.input, config.batch_size)?;
    let mut sink = IncrementalSink::new(&config.output);

    let counts = drive(&mut source, &lookups.districts, cutoff, &mut sink)?;

    let summary = PipelineSummary {
        cutoff,
        batches_read: counts.read,
        batches_written: counts.written,
        rows_read: source.rows_read(),
        rows_skipped: source.rows_skipped(),
        rows_written: sink.rows_written(),
    };
    info!(
        rows_written = summary.rows_written,
        rows_read = summary.rows_read,
        rows_skipped = summary.rows_skipped,
        output = %sink.path().display(),
        "Total processed rows"
    );

    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub read: u64,
    pub written: u64,
}

/// Pulls one batch at a time, cleans it and hands it to the sink before pulling the next.
/// Batches that clean down to nothing never reach the sink.
pub fn drive<I>(
    batches: I,
    districts: &DistrictMapping,
    cutoff: NaiveDateTime,
    sink: &mut IncrementalSink,
) -> Result<BatchCounts>
where
    I: IntoIterator<Item = Result<Batch>>,
{
    let mut counts = BatchCounts::default();

    for (index, batch) in batches.into_iter().enumerate() {
        let batch = batch?;
        counts.read += 1;

        let (cleaned, stats) = clean_batch_with_stats(batch, districts, cutoff);
        debug!(batch = index, ?stats, "Cleaned batch");
        if cleaned.is_empty() {
            continue;
        }

        sink.write(&cleaned)?;
        counts.written += 1;
        info!(rows = sink.rows_written(), "Processed rows");
    }

    Ok(counts)
}
