use crate::error::{PipelineError, Result};
use crate::record::{Batch, RawRecord, REQUIRED_COLUMNS};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// Lazy, single-pass sequence of typed batches read from the raw incident file.
///
/// No batch holds more than `batch_size` records. Rows whose typed fields cannot be
/// deserialized are skipped and counted; I/O failures end the sequence with an error.
pub struct BatchSource {
    records: DeserializeRecordsIntoIter<File, RawRecord>,
    batch_size: usize,
    rows_read: u64,
    rows_skipped: u64,
    finished: bool,
}

impl BatchSource {
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidBatchSize(batch_size));
        }
        if !path.exists() {
            return Err(PipelineError::MissingPrimaryInput(path.to_path_buf()));
        }

        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

        let headers = rdr.headers()?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        Ok(Self {
            records: rdr.into_deserialize(),
            batch_size,
            rows_read: 0,
            rows_skipped: 0,
            finished: false,
        })
    }

    /// Data rows consumed so far, including skipped ones.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn rows_skipped(&self) -> u64 {
        self.rows_skipped
    }
}

impl Iterator for BatchSource {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.min(8192));
        while batch.len() < self.batch_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    self.rows_read += 1;
                    batch.push(record);
                }
                Some(Err(e)) if e.is_io_error() => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                Some(Err(e)) => {
                    self.rows_read += 1;
                    self.rows_skipped += 1;
                    warn!(error = %e, "Skipping invalid CSV line");
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
