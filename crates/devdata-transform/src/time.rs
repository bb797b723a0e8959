//! Device-local time derivation.
//!
//! `timezoneOffset` is the number of minutes to *add* to the absolute time to
//! get the device's wall clock, i.e. an east-of-UTC offset. Date libraries
//! that model offsets as "minutes to add to local to get UTC" need the sign
//! flipped; here the offset feeds [`FixedOffset::east_opt`] directly.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SubsecRound, Utc};

use devdata_model::DeviceEvent;

use crate::error::{PipelineError, Result, Stage};

/// Computes the device-local wall-clock time, at second precision.
///
/// Without an offset the record is taken to be device-local already and the
/// absolute time is rendered as-is. Returns None if the offset is a day or more.
pub fn device_time_for(time: DateTime<Utc>, offset_minutes: Option<i32>) -> Option<NaiveDateTime> {
    let local = match offset_minutes {
        None => time.naive_utc(),
        Some(minutes) => {
            let offset = FixedOffset::east_opt(minutes.checked_mul(60)?)?;
            time.with_timezone(&offset).naive_local()
        }
    };
    Some(local.trunc_subsecs(0))
}

/// Sets `deviceTime` from `time` and `timezoneOffset`.
///
/// Records without `time` end up without `deviceTime`.
pub fn normalize_device_time(event: &mut DeviceEvent) -> Result<()> {
    let Some(time) = event.time else {
        event.device_time = None;
        return Ok(());
    };
    match device_time_for(time, event.timezone_offset) {
        Some(local) => {
            event.device_time = Some(local);
            Ok(())
        }
        None => Err(PipelineError::malformed(
            &event.id,
            Stage::TimeNormalizer,
            format!(
                "timezoneOffset {} is outside one day",
                event.timezone_offset.unwrap_or_default()
            ),
        )),
    }
}

/// Lazy adapter applying [`normalize_device_time`] to each record.
pub struct TimeNormalizer<I> {
    inner: I,
}

impl<I> TimeNormalizer<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> Iterator for TimeNormalizer<I>
where
    I: Iterator<Item = Result<DeviceEvent>>,
{
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| {
            item.and_then(|mut event| {
                normalize_device_time(&mut event)?;
                Ok(event)
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
