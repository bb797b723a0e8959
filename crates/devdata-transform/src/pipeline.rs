//! Batch orchestration.
//!
//! A [`Pipeline`] runs the five stages in fixed order over one batch:
//!
//! 1. **time_normalizer** - derive `deviceTime`
//! 2. **unit_converter** - glucose mmol/L to mg/dL
//! 3. **basal_reshaper** - resolve basal intervals
//! 4. **bolus_reshaper** - canonical bolus shape
//! 5. **wizard_reshaper** - join wizards onto boluses
//!
//! A run either returns every normalized record or a single error; partial
//! output is never handed back.
//!
//! Running a pipeline over its own output is not supported. Glucose readings
//! are marked mg/dL after conversion so a second pass leaves their values
//! alone, but the result is not otherwise guaranteed to be stable.

use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, info_span};

use devdata_model::{DeviceEvent, EventId, OrderingMode, ProcessingOptions};

use crate::error::{PipelineError, Result, Stage};
use crate::stats::PipelineStats;
use crate::stream::{EventResult, EventStreamExt};

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedBatch {
    pub events: Vec<DeviceEvent>,
    pub stats: PipelineStats,
}

/// Configured pipeline. Holds no per-batch state and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: ProcessingOptions,
}

impl Pipeline {
    pub fn new(options: ProcessingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Normalizes a batch of decoded records.
    pub fn run(&self, mut events: Vec<DeviceEvent>) -> Result<NormalizedBatch> {
        let input_records = events.len();
        if self.options.ordering == OrderingMode::SortByTime {
            sort_by_time(&mut events);
        }
        self.execute(events.into_iter().map(Ok), input_records)
    }

    /// Decodes raw JSON records, then normalizes them.
    ///
    /// With [`OrderingMode::AssumeSorted`] decoding happens lazily inside the
    /// same pass as the stages.
    pub fn run_values(&self, records: Vec<Value>) -> Result<NormalizedBatch> {
        let input_records = records.len();
        match self.options.ordering {
            OrderingMode::AssumeSorted => {
                self.execute(records.into_iter().map(decode_record), input_records)
            }
            OrderingMode::SortByTime => {
                let mut events = records
                    .into_iter()
                    .map(decode_record)
                    .collect::<Result<Vec<_>>>()
                    .inspect_err(report_failure)?;
                sort_by_time(&mut events);
                self.execute(events.into_iter().map(Ok), input_records)
            }
        }
    }

    fn execute<I>(&self, input: I, input_records: usize) -> Result<NormalizedBatch>
    where
        I: Iterator<Item = EventResult>,
    {
        let span = info_span!("normalize", records = input_records);
        let _guard = span.enter();
        let start = Instant::now();

        let events = input
            .normalize_time()
            .convert_units()
            .reshape_basal()
            .warn_on_truncation(self.options.warn_on_truncation)
            .reshape_bolus()
            .reshape_wizard()
            .collect::<Result<Vec<_>>>()
            .inspect_err(report_failure)?;

        let stats = PipelineStats::collect(input_records, &events, start.elapsed());
        info!(
            input_records = stats.input_records,
            output_records = stats.output_records,
            basal_segments = stats.basal_segments,
            boluses = stats.boluses,
            wizards_joined = stats.wizards_joined,
            duration_ms = stats.elapsed_ms,
            "normalization complete"
        );
        Ok(NormalizedBatch { events, stats })
    }
}

/// Decodes one raw record, reporting failures as malformed at the decode stage.
pub fn decode_record(value: Value) -> EventResult {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| EventId::new(raw).ok());
    DeviceEvent::from_value(value).map_err(|source| PipelineError::MalformedRecord {
        id,
        stage: Stage::Decode,
        reason: source.to_string(),
    })
}

/// Stable sort on absolute time, falling back to a basal segment's start.
/// Records with neither come first.
pub fn sort_by_time(events: &mut [DeviceEvent]) {
    events.sort_by_key(DeviceEvent::timeline_instant);
}

/// Runs a default pipeline and keeps only the records.
pub fn normalize(events: Vec<DeviceEvent>) -> Result<Vec<DeviceEvent>> {
    Pipeline::default().run(events).map(|batch| batch.events)
}

fn report_failure(failure: &PipelineError) {
    error!(
        record_id = failure.record_id().map(EventId::as_str),
        stage = %failure.stage(),
        invariant = failure.invariant(),
        "normalization failed: {failure}"
    );
}
