use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file '{}' does not exist", .0.display())]
    MissingPrimaryInput(PathBuf),

    #[error("Input file '{}' is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("Retention window of {0} years cannot be represented")]
    InvalidRetention(u32),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
