use crate::error::Result;
use crate::record::{CleanedRecord, OUTPUT_HEADER};

use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Appends cleaned batches to the output CSV.
///
/// The destination is truncated and given its header on the first write that carries
/// rows. Every later write appends rows only. Each batch is flushed before returning.
pub struct IncrementalSink {
    path: PathBuf,
    writer: Option<Writer<File>>,
    rows_written: u64,
}

impl IncrementalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Running total of data rows written.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// True once the header has been written.
    pub fn has_written(&self) -> bool {
        self.writer.is_some()
    }

    /// Writes one batch and returns the number of rows written. An empty batch is a no-op
    /// and does not count as the first write.
    pub fn write(&mut self, batch: &[CleanedRecord]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => open_with_header(&self.path)?,
        };
        let result = write_rows(&mut writer, batch);
        self.writer = Some(writer);
        result?;

        self.rows_written += batch.len() as u64;
        Ok(batch.len())
    }
}

fn open_with_header(path: &Path) -> Result<Writer<File>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);
    writer.write_record(OUTPUT_HEADER)?;
    Ok(writer)
}

fn write_rows(writer: &mut Writer<File>, batch: &[CleanedRecord]) -> Result<()> {
    for record in batch {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
