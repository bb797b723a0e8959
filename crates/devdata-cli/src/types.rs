use std::path::PathBuf;

use devdata_ingest::BatchFormat;
use devdata_transform::NormalizedBatch;

#[derive(Debug)]
pub struct NormalizeResult {
    pub input: PathBuf,
    pub format: BatchFormat,
    /// None when records were written to stdout.
    pub output: Option<PathBuf>,
    pub batch: NormalizedBatch,
}
