pub mod engine;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod reference;
pub mod sink;
pub mod source;

pub use engine::cleaner::{clean_batch, clean_batch_with_stats, CleanStats};
pub use error::{PipelineError, Result};
pub use pipeline::{compute_cutoff, run_pipeline, run_pipeline_at, PipelineConfig, PipelineSummary};
pub use record::{Batch, CleanedRecord, RawRecord};
pub use reference::{load_lookups, DistrictMapping, Lookups};
pub use sink::IncrementalSink;
pub use source::BatchSource;

use std::path::Path;

/// Opens the raw incident file as a lazy sequence of batches of at most `batch_size` rows.
pub fn stream_batches(path: &Path, batch_size: usize) -> Result<BatchSource> {
    BatchSource::open(path, batch_size)
}
