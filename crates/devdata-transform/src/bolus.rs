//! Bolus canonicalization.

use chrono::{DateTime, Utc};
use tracing::debug;

use devdata_model::{BolusDose, BolusShape, DeviceEvent, EventId, EventPayload};

use crate::error::{PipelineError, Result, Stage};

/// Brings a bolus record into canonical form.
///
/// The shape is derived from which amounts are present, a normal-only dose
/// gets an explicit zero duration, and `end` is set to `time + duration`.
/// Expected amounts are left untouched so interrupted doses stay visible.
/// Non-bolus records pass through.
pub fn reshape_bolus(mut event: DeviceEvent) -> Result<DeviceEvent> {
    let DeviceEvent {
        id, time, payload, ..
    } = &mut event;
    if let EventPayload::Bolus(dose) = payload {
        canonicalize(id, *time, dose)?;
    }
    Ok(event)
}

fn canonicalize(id: &EventId, time: Option<DateTime<Utc>>, dose: &mut BolusDose) -> Result<()> {
    let malformed = |reason: String| PipelineError::malformed(id, Stage::BolusReshaper, reason);

    let amounts = [
        ("normal", dose.normal),
        ("extended", dose.extended),
        ("expectedNormal", dose.expected_normal),
        ("expectedExtended", dose.expected_extended),
    ];
    for (field, amount) in amounts {
        if amount.is_some_and(|units| !units.is_finite() || units < 0.0) {
            return Err(malformed(format!("bolus has an invalid {field} amount")));
        }
    }

    let Some(shape) = dose.shape() else {
        return Err(malformed("bolus has neither normal nor extended amount".to_string()));
    };
    if shape == BolusShape::Normal {
        dose.duration.get_or_insert(0);
    } else if dose.duration.is_none() {
        return Err(malformed(format!("{shape} bolus has no duration")));
    }

    if let Some(recorded) = dose.sub_type
        && recorded != shape
    {
        debug!(%id, %recorded, derived = %shape, "bolus subType disagrees with its amounts");
    }
    dose.sub_type = Some(shape);

    let Some(length) = dose.duration_delta() else {
        return Err(malformed("bolus duration is out of range".to_string()));
    };
    dose.end = match time {
        Some(time) => Some(
            time.checked_add_signed(length)
                .ok_or_else(|| malformed("bolus end is out of range".to_string()))?,
        ),
        None => None,
    };
    Ok(())
}

/// Lazy adapter applying [`reshape_bolus`] to each record.
pub struct BolusReshaper<I> {
    inner: I,
}

impl<I> BolusReshaper<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> Iterator for BolusReshaper<I>
where
    I: Iterator<Item = Result<DeviceEvent>>,
{
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| item.and_then(reshape_bolus))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn bolus(dose: BolusDose) -> DeviceEvent {
        DeviceEvent::new(EventId::new("b1").unwrap(), EventPayload::Bolus(dose))
            .with_time(Utc.with_ymd_and_hms(2014, 3, 6, 12, 0, 0).unwrap())
    }

    #[test]
    fn normal_bolus_gets_zero_duration() {
        let event = reshape_bolus(bolus(BolusDose::normal(2.5))).unwrap();
        let dose = event.as_bolus().unwrap();
        assert_eq!(dose.sub_type, Some(BolusShape::Normal));
        assert_eq!(dose.duration, Some(0));
        assert_eq!(dose.end, event.time);
    }

    #[test]
    fn combo_bolus_ends_after_extended_portion() {
        let event = reshape_bolus(bolus(BolusDose::combo(1.0, 2.0, 7_200_000))).unwrap();
        let dose = event.as_bolus().unwrap();
        assert_eq!(dose.sub_type, Some(BolusShape::Combo));
        assert_eq!(dose.end, event.time.map(|t| t + TimeDelta::hours(2)));
    }

    #[test]
    fn recorded_shape_is_corrected() {
        let mut dose = BolusDose::normal(1.0);
        dose.sub_type = Some(BolusShape::Extended);
        let event = reshape_bolus(bolus(dose)).unwrap();
        assert_eq!(event.as_bolus().unwrap().sub_type, Some(BolusShape::Normal));
    }

    #[test]
    fn interrupted_amounts_are_preserved() {
        let event = reshape_bolus(bolus(BolusDose::normal(1.5).with_expected_normal(3.0))).unwrap();
        let dose = event.as_bolus().unwrap();
        assert_eq!(dose.normal, Some(1.5));
        assert_eq!(dose.expected_normal, Some(3.0));
        assert!(dose.is_interrupted());
    }

    #[test]
    fn extended_without_duration_is_malformed() {
        let mut dose = BolusDose::extended(2.0, 0);
        dose.duration = None;
        let error = reshape_bolus(bolus(dose)).unwrap_err();
        assert_eq!(error.stage(), Stage::BolusReshaper);
    }

    #[test]
    fn empty_or_negative_doses_are_malformed() {
        assert!(reshape_bolus(bolus(BolusDose::default())).is_err());
        assert!(reshape_bolus(bolus(BolusDose::normal(-1.0))).is_err());
    }
}
