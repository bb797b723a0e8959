//! CLI library components for the device data normalizer.

pub mod logging;
pub mod pipeline;
pub mod types;
