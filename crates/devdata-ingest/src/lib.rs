//! Loading raw device telemetry batches.

pub mod batch;
pub mod error;

pub use batch::{BatchFormat, RawBatch, parse_batch, read_batch, read_batch_from};
pub use error::{IngestError, Result};
