//! Record model for device telemetry batches.
//!
//! - **event**: the polymorphic [`DeviceEvent`] and its JSON shape
//! - **glucose**, **basal**, **bolus**, **wizard**: typed payloads
//! - **device_time**: naive device-local timestamps
//! - **options**: normalization configuration

pub mod basal;
pub mod bolus;
pub mod device_time;
pub mod enums;
pub mod error;
pub mod event;
pub mod glucose;
pub mod ids;
mod millis;
pub mod options;
pub mod wizard;

pub use basal::{BasalSegment, SuppressedChain};
pub use bolus::BolusDose;
pub use device_time::{DEVICE_TIME_FORMAT, format_device_time, parse_device_time};
pub use enums::{BolusShape, DeliveryType, EventType, GlucoseUnits};
pub use error::{ModelError, Result};
pub use event::{DeviceEvent, EventPayload, OtherRecord};
pub use glucose::{GlucoseReading, MMOL_L_TO_MG_DL};
pub use ids::EventId;
pub use options::{OrderingMode, ProcessingOptions};
pub use wizard::{BolusReference, EmbeddedBolus, Recommendation, WizardAnnotation, WizardRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_presets() {
        let default = ProcessingOptions::default();
        assert_eq!(default.ordering, OrderingMode::AssumeSorted);
        assert!(!default.warn_on_truncation);

        let strict = ProcessingOptions::strict();
        assert_eq!(strict.ordering, OrderingMode::SortByTime);
        assert!(strict.warn_on_truncation);
    }

    #[test]
    fn options_serialize() {
        let options = ProcessingOptions::new().with_ordering(OrderingMode::SortByTime);
        let json = serde_json::to_string(&options).expect("serialize options");
        let round: ProcessingOptions = serde_json::from_str(&json).expect("deserialize options");
        assert_eq!(round.ordering, OrderingMode::SortByTime);
    }
}
