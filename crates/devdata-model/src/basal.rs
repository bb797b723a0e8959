//! Basal-rate delivery segments.
//!
//! A temp or suspend segment may carry the scheduled segment it overrides in
//! `suppressed`, and that segment may itself carry a further suppressed one.
//! The chain is owned and walked iteratively, so its depth is unbounded.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::DeliveryType;

/// Payload of a `basal` record, and of each link in a `suppressed` chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasalSegment {
    pub delivery_type: DeliveryType,
    /// Units per hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// Fraction of the suppressed rate, for percentage temp basals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Programmed length in milliseconds.
    #[serde(
        default,
        deserialize_with = "crate::millis::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<u64>,
    /// Interval start. When absent the basal reshaper fills it from `time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Resolved interval end; stays unset only for an open-ended final segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppressed: Option<Box<BasalSegment>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BasalSegment {
    pub fn new(delivery_type: DeliveryType) -> Self {
        Self {
            delivery_type,
            rate: None,
            percent: None,
            duration: None,
            start: None,
            end: None,
            suppressed: None,
            extra: Map::new(),
        }
    }

    pub fn scheduled(rate: f64) -> Self {
        Self::new(DeliveryType::Scheduled).with_rate(rate)
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_percent(mut self, percent: f64) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn with_duration_ms(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_suppressed(mut self, suppressed: BasalSegment) -> Self {
        self.suppressed = Some(Box::new(suppressed));
        self
    }

    /// Programmed duration as a time delta, if present and representable.
    pub fn duration_delta(&self) -> Option<TimeDelta> {
        let millis = i64::try_from(self.duration?).ok()?;
        TimeDelta::try_milliseconds(millis)
    }

    /// Iterates the suppressed segments beneath this one, outermost first.
    pub fn suppressed_chain(&self) -> SuppressedChain<'_> {
        SuppressedChain {
            next: self.suppressed.as_deref(),
        }
    }

    /// Number of suppressed segments beneath this one.
    pub fn suppression_depth(&self) -> usize {
        self.suppressed_chain().count()
    }

    /// The innermost segment of the chain, if it is a scheduled segment.
    ///
    /// For a plain scheduled segment this is the segment itself.
    pub fn terminal_scheduled(&self) -> Option<&BasalSegment> {
        let terminal = self.suppressed_chain().last().unwrap_or(self);
        (terminal.delivery_type == DeliveryType::Scheduled).then_some(terminal)
    }

    /// Rate the schedule would have delivered absent any override.
    pub fn scheduled_rate(&self) -> Option<f64> {
        self.terminal_scheduled().and_then(|segment| segment.rate)
    }

    /// Rate actually delivered during this segment.
    ///
    /// Suspends deliver nothing. A temp basal recorded as a percentage
    /// delivers that fraction of whatever it suppressed.
    pub fn effective_rate(&self) -> Option<f64> {
        let mut factor = 1.0;
        let mut segment = self;
        loop {
            match segment.delivery_type {
                DeliveryType::Suspend => return Some(0.0),
                DeliveryType::Scheduled => return segment.rate.map(|rate| rate * factor),
                DeliveryType::Temp => {
                    if let Some(rate) = segment.rate {
                        return Some(rate * factor);
                    }
                    factor *= segment.percent?;
                    segment = segment.suppressed.as_deref()?;
                }
            }
        }
    }

    /// Resolved interval length, if both ends are known.
    pub fn resolved_length(&self) -> Option<TimeDelta> {
        Some(self.end? - self.start?)
    }

    /// True when the resolved end falls before the programmed end.
    pub fn is_truncated(&self) -> bool {
        match (self.resolved_length(), self.duration_delta()) {
            (Some(resolved), Some(programmed)) => resolved < programmed,
            _ => false,
        }
    }
}

/// Iterator over a segment's suppressed chain.
pub struct SuppressedChain<'a> {
    next: Option<&'a BasalSegment>,
}

impl<'a> Iterator for SuppressedChain<'a> {
    type Item = &'a BasalSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.suppressed.as_deref();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(depth: usize) -> BasalSegment {
        let mut segment = BasalSegment::scheduled(0.8);
        for level in 0..depth {
            segment = BasalSegment::new(DeliveryType::Temp)
                .with_rate(level as f64)
                .with_suppressed(segment);
        }
        segment
    }

    #[test]
    fn scheduled_rate_walks_to_the_terminal_segment() {
        let segment = nested(3);
        assert_eq!(segment.suppression_depth(), 3);
        assert_eq!(segment.scheduled_rate(), Some(0.8));
        assert_eq!(segment.effective_rate(), Some(2.0));
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let segment = nested(1_000);
        assert_eq!(segment.suppression_depth(), 1_000);
        assert_eq!(segment.scheduled_rate(), Some(0.8));
    }

    #[test]
    fn percentage_temp_uses_suppressed_rate() {
        let segment = BasalSegment::new(DeliveryType::Temp)
            .with_percent(0.5)
            .with_suppressed(BasalSegment::scheduled(1.2));
        assert_eq!(segment.effective_rate(), Some(0.6));
    }

    #[test]
    fn suspend_delivers_nothing() {
        let segment =
            BasalSegment::new(DeliveryType::Suspend).with_suppressed(BasalSegment::scheduled(1.0));
        assert_eq!(segment.effective_rate(), Some(0.0));
        assert_eq!(segment.scheduled_rate(), Some(1.0));
    }

    #[test]
    fn chain_ending_in_override_has_no_scheduled_rate() {
        let segment = BasalSegment::new(DeliveryType::Temp)
            .with_rate(1.0)
            .with_suppressed(BasalSegment::new(DeliveryType::Suspend));
        assert_eq!(segment.terminal_scheduled(), None);
    }
}
