use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::EventId;

/// Payload of a `wizard` (bolus calculator) record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardRecord {
    /// Forward reference to the dose this recommendation produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bolus: Option<BolusReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carb_input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<Recommendation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WizardRecord {
    pub fn for_bolus(bolus: EventId) -> Self {
        Self {
            bolus: Some(BolusReference::Id(bolus)),
            ..Self::default()
        }
    }

    /// Identity of the referenced bolus.
    pub fn bolus_id(&self) -> Option<&EventId> {
        self.bolus.as_ref().map(BolusReference::id)
    }

    /// Builds the annotation carried by the joined bolus.
    pub fn annotation(&self, wizard_id: EventId) -> WizardAnnotation {
        WizardAnnotation {
            wizard_id,
            bg_input: self.bg_input,
            carb_input: self.carb_input,
            recommended: self.recommended.clone(),
        }
    }
}

/// A wizard's `bolus` field: a bare id, or the bolus record embedded whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BolusReference {
    Id(EventId),
    Embedded(EmbeddedBolus),
}

impl BolusReference {
    pub fn id(&self) -> &EventId {
        match self {
            BolusReference::Id(id) => id,
            BolusReference::Embedded(bolus) => &bolus.id,
        }
    }
}

/// A bolus record embedded in a wizard, kept verbatim apart from its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedBolus {
    pub id: EventId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Dose suggested by the calculator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wizard fields copied onto the bolus they were joined to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardAnnotation {
    #[serde(rename = "id")]
    pub wizard_id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carb_input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_by_id_or_embedded_record() {
        let by_id: WizardRecord = serde_json::from_value(json!({ "bolus": "b1" })).unwrap();
        assert_eq!(by_id.bolus_id().map(EventId::as_str), Some("b1"));

        let embedded: WizardRecord = serde_json::from_value(json!({
            "bolus": { "id": "b2", "type": "bolus", "normal": 1.5 }
        }))
        .unwrap();
        assert_eq!(embedded.bolus_id().map(EventId::as_str), Some("b2"));
        let Some(BolusReference::Embedded(bolus)) = &embedded.bolus else {
            panic!("expected embedded bolus");
        };
        assert_eq!(bolus.fields.get("normal"), Some(&json!(1.5)));
    }

    #[test]
    fn annotation_copies_calculator_fields() {
        let record: WizardRecord = serde_json::from_value(json!({
            "bolus": "b1",
            "bgInput": 6.2,
            "carbInput": 45,
            "recommended": { "carb": 3.0, "correction": 0.5, "net": 3.5 },
            "insulinOnBoard": 1.1
        }))
        .unwrap();
        let annotation = record.annotation(EventId::new("w1").unwrap());
        assert_eq!(annotation.wizard_id.as_str(), "w1");
        assert_eq!(annotation.carb_input, Some(45.0));
        assert_eq!(annotation.recommended.and_then(|r| r.net), Some(3.5));
        assert_eq!(record.extra.get("insulinOnBoard"), Some(&json!(1.1)));
    }
}
