use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::GlucoseUnits;

/// Multiplier from mmol/L to mg/dL.
pub const MMOL_L_TO_MG_DL: f64 = 18.01559;

/// Payload of a `cbg` or `smbg` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseReading {
    pub value: f64,
    /// Absent on raw records, which are mmol/L by convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<GlucoseUnits>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GlucoseReading {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            units: None,
            extra: Map::new(),
        }
    }

    pub fn with_units(mut self, units: GlucoseUnits) -> Self {
        self.units = Some(units);
        self
    }

    /// Units of `value`, defaulting to mmol/L.
    pub fn units(&self) -> GlucoseUnits {
        self.units.unwrap_or(GlucoseUnits::MmolL)
    }

    /// Rescales `value` to mg/dL and marks the reading as converted.
    ///
    /// Returns false, leaving the reading untouched, if it is already in mg/dL.
    pub fn convert_to_mg_dl(&mut self) -> bool {
        if self.units() == GlucoseUnits::MgDl {
            return false;
        }
        self.value *= MMOL_L_TO_MG_DL;
        self.units = Some(GlucoseUnits::MgDl);
        true
    }
}
