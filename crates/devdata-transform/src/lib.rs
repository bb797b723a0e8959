//! Device telemetry normalization.
//!
//! Stages are lazy iterator adapters over `Result<DeviceEvent, PipelineError>`
//! and are normally driven through [`Pipeline`]. See [`pipeline`] for the
//! stage order.

pub mod basal;
pub mod bolus;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod stream;
pub mod time;
pub mod units;
pub mod wizard;

pub use basal::BasalReshaper;
pub use bolus::{BolusReshaper, reshape_bolus};
pub use error::{PipelineError, Result, Stage, UNKNOWN_RECORD_ID};
pub use pipeline::{NormalizedBatch, Pipeline, decode_record, normalize, sort_by_time};
pub use stats::PipelineStats;
pub use stream::{EventResult, EventStreamExt};
pub use time::{TimeNormalizer, device_time_for, normalize_device_time};
pub use units::{UnitConverter, convert_glucose};
pub use wizard::{WizardReshaper, join_wizards};
