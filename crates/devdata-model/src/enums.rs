//! Type-safe enumerations for device telemetry records.
//!
//! These enums give compile-time safety to concepts that arrive as
//! strings in the remote store's JSON records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Record types the pipeline understands.
///
/// Any other `type` string is carried through as an opaque record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Continuous glucose monitor reading.
    Cbg,
    /// Self-monitored (fingerstick) glucose reading.
    Smbg,
    /// Basal-rate delivery segment.
    Basal,
    /// Bolus dose.
    Bolus,
    /// Bolus calculator recommendation.
    Wizard,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::Cbg,
        EventType::Smbg,
        EventType::Basal,
        EventType::Bolus,
        EventType::Wizard,
    ];

    /// Returns the wire name as it appears in the `type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Cbg => "cbg",
            EventType::Smbg => "smbg",
            EventType::Basal => "basal",
            EventType::Bolus => "bolus",
            EventType::Wizard => "wizard",
        }
    }

    /// Returns true for the two glucose reading types.
    pub fn is_glucose(&self) -> bool {
        matches!(self, EventType::Cbg | EventType::Smbg)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cbg" => Ok(EventType::Cbg),
            "smbg" => Ok(EventType::Smbg),
            "basal" => Ok(EventType::Basal),
            "bolus" => Ok(EventType::Bolus),
            "wizard" => Ok(EventType::Wizard),
            _ => Err(ModelError::UnknownVariant {
                what: "event type",
                value: s.to_string(),
            }),
        }
    }
}

/// How a basal segment was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Programmed schedule.
    Scheduled,
    /// Time-limited override of the schedule.
    Temp,
    /// Delivery paused.
    Suspend,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Scheduled => "scheduled",
            DeliveryType::Temp => "temp",
            DeliveryType::Suspend => "suspend",
        }
    }

    /// Returns true if this segment overrides the schedule.
    pub fn is_override(&self) -> bool {
        !matches!(self, DeliveryType::Scheduled)
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(DeliveryType::Scheduled),
            "temp" => Ok(DeliveryType::Temp),
            "suspend" => Ok(DeliveryType::Suspend),
            _ => Err(ModelError::UnknownVariant {
                what: "delivery type",
                value: s.to_string(),
            }),
        }
    }
}

/// Glucose concentration units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlucoseUnits {
    #[serde(rename = "mmol/L", alias = "mmol/l")]
    MmolL,
    #[serde(rename = "mg/dL", alias = "mg/dl")]
    MgDl,
}

impl GlucoseUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseUnits::MmolL => "mmol/L",
            GlucoseUnits::MgDl => "mg/dL",
        }
    }
}

impl fmt::Display for GlucoseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery shape of a bolus, serialized as its `subType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BolusShape {
    /// Immediate delivery only.
    #[serde(rename = "normal")]
    Normal,
    /// Extended delivery only.
    #[serde(rename = "square")]
    Extended,
    /// Immediate portion followed by an extended portion.
    #[serde(rename = "dual/square")]
    Combo,
}

impl BolusShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BolusShape::Normal => "normal",
            BolusShape::Extended => "square",
            BolusShape::Combo => "dual/square",
        }
    }

    /// Derives the shape from which delivered amounts are present.
    pub fn from_amounts(normal: Option<f64>, extended: Option<f64>) -> Option<Self> {
        match (normal, extended) {
            (Some(_), None) => Some(BolusShape::Normal),
            (None, Some(_)) => Some(BolusShape::Extended),
            (Some(_), Some(_)) => Some(BolusShape::Combo),
            (None, None) => None,
        }
    }
}

impl fmt::Display for BolusShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
