//! Batch summary counts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use devdata_model::{DeviceEvent, EventPayload, GlucoseUnits};

/// Counts describing one normalized batch.
///
/// Derived from the input size and the output records alone; stages keep no
/// counters of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub input_records: usize,
    pub output_records: usize,
    /// Output records per `type` value, unknown types included.
    pub by_type: BTreeMap<String, usize>,
    pub glucose_readings: usize,
    /// Glucose readings reported in mg/dL.
    pub glucose_converted: usize,
    /// Glucose readings left in input units because they carried no time.
    pub glucose_unconverted: usize,
    pub basal_segments: usize,
    pub basal_truncated: usize,
    pub basal_open_ended: usize,
    pub boluses: usize,
    pub boluses_interrupted: usize,
    pub wizards_joined: usize,
    pub wizards_standalone: usize,
    /// Records of unrecognised types, passed through untouched.
    pub passthrough_records: usize,
    pub records_without_time: usize,
    pub elapsed_ms: u64,
}

impl PipelineStats {
    pub fn collect(input_records: usize, events: &[DeviceEvent], elapsed: Duration) -> Self {
        let mut stats = Self {
            input_records,
            output_records: events.len(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        };
        for event in events {
            *stats.by_type.entry(event.kind_name().to_string()).or_default() += 1;
            if event.time.is_none() {
                stats.records_without_time += 1;
            }
            match &event.payload {
                EventPayload::Cbg(reading) | EventPayload::Smbg(reading) => {
                    stats.glucose_readings += 1;
                    if reading.units() == GlucoseUnits::MgDl {
                        stats.glucose_converted += 1;
                    } else {
                        stats.glucose_unconverted += 1;
                    }
                }
                EventPayload::Basal(segment) => {
                    stats.basal_segments += 1;
                    if segment.is_truncated() {
                        stats.basal_truncated += 1;
                    }
                    if segment.end.is_none() {
                        stats.basal_open_ended += 1;
                    }
                }
                EventPayload::Bolus(dose) => {
                    stats.boluses += 1;
                    if dose.is_interrupted() {
                        stats.boluses_interrupted += 1;
                    }
                    if dose.is_joined() {
                        stats.wizards_joined += 1;
                    }
                }
                EventPayload::Wizard(_) => stats.wizards_standalone += 1,
                EventPayload::Other(_) => stats.passthrough_records += 1,
            }
        }
        stats
    }

    /// Records removed by the wizard join.
    pub fn absorbed_records(&self) -> usize {
        self.input_records.saturating_sub(self.output_records)
    }
}
