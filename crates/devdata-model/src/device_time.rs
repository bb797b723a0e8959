//! Device-local timestamps.
//!
//! A device time is a naive wall-clock reading with second precision and
//! no zone designator, e.g. `2014-03-06T14:30:00`.

use chrono::{NaiveDateTime, SubsecRound};
use serde::Serializer;

/// Wire format for `deviceTime`.
pub const DEVICE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Renders a device time in the wire format.
pub fn format_device_time(value: &NaiveDateTime) -> String {
    value.format(DEVICE_TIME_FORMAT).to_string()
}

/// Parses a device time, accepting (and truncating) fractional seconds.
pub fn parse_device_time(value: &str) -> Option<NaiveDateTime> {
    value
        .trim()
        .parse::<NaiveDateTime>()
        .ok()
        .map(|parsed| parsed.trunc_subsecs(0))
}

pub(crate) fn serialize_option<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format_device_time(value)),
        None => serializer.serialize_none(),
    }
}
