//! Chaining the stages over a record stream.
//!
//! ```ignore
//! use devdata_transform::EventStreamExt;
//!
//! let events = records
//!     .into_iter()
//!     .map(Ok)
//!     .normalize_time()
//!     .convert_units()
//!     .reshape_basal()
//!     .reshape_bolus()
//!     .reshape_wizard()
//!     .collect::<Result<Vec<_>, _>>()?;
//! ```

use devdata_model::DeviceEvent;

use crate::basal::BasalReshaper;
use crate::bolus::BolusReshaper;
use crate::error::PipelineError;
use crate::time::TimeNormalizer;
use crate::units::UnitConverter;
use crate::wizard::WizardReshaper;

/// One item of a record stream.
pub type EventResult = Result<DeviceEvent, PipelineError>;

/// Stage constructors for any stream of [`EventResult`]s.
pub trait EventStreamExt: Iterator<Item = EventResult> + Sized {
    fn normalize_time(self) -> TimeNormalizer<Self> {
        TimeNormalizer::new(self)
    }

    fn convert_units(self) -> UnitConverter<Self> {
        UnitConverter::new(self)
    }

    fn reshape_basal(self) -> BasalReshaper<Self> {
        BasalReshaper::new(self)
    }

    fn reshape_bolus(self) -> BolusReshaper<Self> {
        BolusReshaper::new(self)
    }

    fn reshape_wizard(self) -> WizardReshaper<Self> {
        WizardReshaper::new(self)
    }
}

impl<I> EventStreamExt for I where I: Iterator<Item = EventResult> {}
