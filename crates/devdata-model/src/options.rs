//! Configuration options for batch normalization.

use serde::{Deserialize, Serialize};

/// How the pipeline treats the order of incoming records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderingMode {
    /// Trust the remote store's ascending-time order.
    #[default]
    AssumeSorted,
    /// Stable-sort by `time` (or a basal segment's `start`) before any stage runs;
    /// records with neither sort first.
    SortByTime,
}

/// Options controlling normalization behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Input ordering policy.
    pub ordering: OrderingMode,

    /// Log basal overlap truncations at warn level instead of debug.
    pub warn_on_truncation: bool,
}

impl ProcessingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for untrusted input: sort first and surface every truncation.
    pub fn strict() -> Self {
        Self {
            ordering: OrderingMode::SortByTime,
            warn_on_truncation: true,
        }
    }

    pub fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_warn_on_truncation(mut self, enable: bool) -> Self {
        self.warn_on_truncation = enable;
        self
    }
}
