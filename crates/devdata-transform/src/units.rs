//! Glucose unit conversion.

use devdata_model::DeviceEvent;

use crate::error::Result;

/// Converts a `cbg`/`smbg` reading from mmol/L to mg/dL.
///
/// Only records that carry `time` are converted; glucose records without
/// `time` keep their value and units. Tying conversion to timestamp presence
/// looks accidental but downstream consumers depend on it.
///
/// Readings already marked mg/dL are left alone, so a record is never
/// scaled twice. Returns true if the value changed.
pub fn convert_glucose(event: &mut DeviceEvent) -> bool {
    if event.time.is_none() {
        return false;
    }
    event
        .as_glucose_mut()
        .is_some_and(|reading| reading.convert_to_mg_dl())
}

/// Lazy adapter applying [`convert_glucose`] to each record.
pub struct UnitConverter<I> {
    inner: I,
}

impl<I> UnitConverter<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> Iterator for UnitConverter<I>
where
    I: Iterator<Item = Result<DeviceEvent>>,
{
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| {
            item.map(|mut event| {
                convert_glucose(&mut event);
                event
            })
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use devdata_model::{
        BolusDose, EventId, EventPayload, GlucoseReading, GlucoseUnits, MMOL_L_TO_MG_DL,
    };

    fn cbg(value: f64) -> DeviceEvent {
        DeviceEvent::new(
            EventId::new("c1").unwrap(),
            EventPayload::Cbg(GlucoseReading::new(value)),
        )
    }

    #[test]
    fn converts_timed_glucose() {
        let mut event = cbg(10.0).with_time(Utc.with_ymd_and_hms(2014, 3, 6, 9, 0, 0).unwrap());
        assert!(convert_glucose(&mut event));
        let reading = event.as_glucose().unwrap();
        assert!((reading.value - 10.0 * MMOL_L_TO_MG_DL).abs() < 1e-9);
        assert_eq!(reading.units(), GlucoseUnits::MgDl);
    }

    #[test]
    fn untimed_glucose_is_left_in_input_units() {
        let mut event = cbg(10.0);
        assert!(!convert_glucose(&mut event));
        assert_eq!(event.as_glucose().unwrap().value, 10.0);
        assert_eq!(event.as_glucose().unwrap().units, None);
    }

    #[test]
    fn other_types_are_untouched() {
        let mut event = DeviceEvent::new(
            EventId::new("d1").unwrap(),
            EventPayload::Bolus(BolusDose::normal(2.0)),
        )
        .with_time(Utc.with_ymd_and_hms(2014, 3, 6, 9, 0, 0).unwrap());
        let before = event.clone();
        assert!(!convert_glucose(&mut event));
        assert_eq!(event, before);
    }
}
