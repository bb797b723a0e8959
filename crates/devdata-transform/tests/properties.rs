//! Property tests for the per-record stages.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;

use devdata_model::{DeviceEvent, EventId, EventPayload, GlucoseReading, MMOL_L_TO_MG_DL};
use devdata_transform::{EventStreamExt, convert_glucose, device_time_for};

fn instant(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

fn glucose(value: f64, time: Option<DateTime<Utc>>) -> DeviceEvent {
    let event = DeviceEvent::new(
        EventId::new("g").unwrap(),
        EventPayload::Smbg(GlucoseReading::new(value)),
    );
    match time {
        Some(time) => event.with_time(time),
        None => event,
    }
}

proptest! {
    #[test]
    fn device_time_shifts_by_offset(seconds in 0i64..4_000_000_000, offset in -1439i32..=1439) {
        let time = instant(seconds);
        let local = device_time_for(time, Some(offset)).unwrap();
        prop_assert_eq!(local - time.naive_utc(), TimeDelta::minutes(i64::from(offset)));
    }

    #[test]
    fn zero_offset_is_identity(seconds in 0i64..4_000_000_000) {
        let time = instant(seconds);
        prop_assert_eq!(device_time_for(time, Some(0)), Some(time.naive_utc()));
        prop_assert_eq!(device_time_for(time, None), Some(time.naive_utc()));
    }

    #[test]
    fn device_time_present_iff_time_present(has_time in any::<bool>(), seconds in 0i64..4_000_000_000) {
        let event = glucose(5.0, has_time.then(|| instant(seconds)));
        let out: Vec<_> = std::iter::once(Ok(event))
            .normalize_time()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(out[0].device_time.is_some(), has_time);
    }

    #[test]
    fn glucose_converted_exactly_once(value in 0.5f64..40.0, seconds in 0i64..4_000_000_000) {
        let mut event = glucose(value, Some(instant(seconds)));
        prop_assert!(convert_glucose(&mut event));
        prop_assert!(!convert_glucose(&mut event));
        let converted = event.as_glucose().unwrap().value;
        prop_assert!((converted - value * MMOL_L_TO_MG_DL).abs() < 1e-9);
    }

    #[test]
    fn untimed_glucose_is_unchanged(value in 0.5f64..40.0) {
        let mut event = glucose(value, None);
        prop_assert!(!convert_glucose(&mut event));
        prop_assert_eq!(event.as_glucose().unwrap().value, value);
    }
}
