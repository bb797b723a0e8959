use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::BolusShape;
use crate::wizard::WizardAnnotation;

/// Payload of a `bolus` record.
///
/// After the wizard join this is the pipeline's joined bolus: `wizard` holds
/// the recommendation that produced the dose, when one was found in the batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BolusDose {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<BolusShape>,
    /// Delivered immediate units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<f64>,
    /// Delivered extended units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<f64>,
    /// Length of the extended portion in milliseconds.
    #[serde(
        default,
        deserialize_with = "crate::millis::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_normal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_extended: Option<f64>,
    #[serde(
        default,
        deserialize_with = "crate::millis::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_duration: Option<u64>,
    /// End of delivery, set by the bolus reshaper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wizard: Option<WizardAnnotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BolusDose {
    pub fn normal(units: f64) -> Self {
        Self {
            normal: Some(units),
            ..Self::default()
        }
    }

    pub fn extended(units: f64, duration_ms: u64) -> Self {
        Self {
            extended: Some(units),
            duration: Some(duration_ms),
            ..Self::default()
        }
    }

    pub fn combo(normal: f64, extended: f64, duration_ms: u64) -> Self {
        Self {
            normal: Some(normal),
            ..Self::extended(extended, duration_ms)
        }
    }

    pub fn with_expected_normal(mut self, units: f64) -> Self {
        self.expected_normal = Some(units);
        self
    }

    pub fn with_expected_extended(mut self, units: f64) -> Self {
        self.expected_extended = Some(units);
        self
    }

    /// Shape implied by the delivered amounts.
    pub fn shape(&self) -> Option<BolusShape> {
        BolusShape::from_amounts(self.normal, self.extended)
    }

    pub fn duration_delta(&self) -> Option<TimeDelta> {
        let millis = i64::try_from(self.duration?).ok()?;
        TimeDelta::try_milliseconds(millis)
    }

    /// Units actually delivered.
    pub fn delivered_total(&self) -> f64 {
        self.normal.unwrap_or(0.0) + self.extended.unwrap_or(0.0)
    }

    /// Units that were programmed; equals the delivered total unless interrupted.
    pub fn programmed_total(&self) -> f64 {
        self.expected_normal.or(self.normal).unwrap_or(0.0)
            + self.expected_extended.or(self.extended).unwrap_or(0.0)
    }

    /// True when an expected amount differs from what was delivered.
    pub fn is_interrupted(&self) -> bool {
        diverges(self.expected_normal, self.normal)
            || diverges(self.expected_extended, self.extended)
    }

    /// True once a wizard recommendation has been joined onto this dose.
    pub fn is_joined(&self) -> bool {
        self.wizard.is_some()
    }
}

fn diverges(expected: Option<f64>, actual: Option<f64>) -> bool {
    match expected {
        Some(expected) => actual != Some(expected),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_when_expected_differs() {
        let dose = BolusDose::normal(2.0).with_expected_normal(3.0);
        assert!(dose.is_interrupted());
        assert_eq!(dose.normal, Some(2.0));
        assert_eq!(dose.expected_normal, Some(3.0));
        assert_eq!(dose.delivered_total(), 2.0);
        assert_eq!(dose.programmed_total(), 3.0);
    }

    #[test]
    fn expected_equal_to_actual_is_not_interrupted() {
        let dose = BolusDose::normal(2.0).with_expected_normal(2.0);
        assert!(!dose.is_interrupted());
    }

    #[test]
    fn combo_totals() {
        let dose = BolusDose::combo(1.0, 2.5, 3_600_000).with_expected_extended(4.0);
        assert_eq!(dose.shape(), Some(BolusShape::Combo));
        assert_eq!(dose.delivered_total(), 3.5);
        assert_eq!(dose.programmed_total(), 5.0);
        assert!(dose.is_interrupted());
    }
}
