//! Batch-level pipeline failures.
//!
//! Every variant aborts the whole batch. Each carries the offending record's
//! id, the stage that detected it and the invariant it violates, so callers can
//! log the cause and surface a "data could not be loaded" condition.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use devdata_model::EventId;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decode,
    TimeNormalizer,
    UnitConverter,
    BasalReshaper,
    BolusReshaper,
    WizardReshaper,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Decode,
        Stage::TimeNormalizer,
        Stage::UnitConverter,
        Stage::BasalReshaper,
        Stage::BolusReshaper,
        Stage::WizardReshaper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Decode => "decode",
            Stage::TimeNormalizer => "time_normalizer",
            Stage::UnitConverter => "unit_converter",
            Stage::BasalReshaper => "basal_reshaper",
            Stage::BolusReshaper => "bolus_reshaper",
            Stage::WizardReshaper => "wizard_reshaper",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder shown when a record failed before its id could be read.
pub const UNKNOWN_RECORD_ID: &str = "<no id>";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A field the record's type mandates is missing or unusable.
    #[error(
        "malformed record {} in {stage}: {reason}",
        .id.as_ref().map_or(UNKNOWN_RECORD_ID, EventId::as_str)
    )]
    MalformedRecord {
        id: Option<EventId>,
        stage: Stage,
        reason: String,
    },

    /// More than one wizard claims the same bolus.
    #[error("ambiguous join in {stage}: bolus {bolus_id} is claimed by wizard {first} and wizard {second}")]
    AmbiguousJoin {
        bolus_id: EventId,
        first: EventId,
        second: EventId,
        stage: Stage,
    },

    /// A non-terminal basal segment whose end cannot be resolved.
    #[error("unresolved interval in {stage}: basal {id} starting {start} has no usable following segment and no duration")]
    UnresolvedInterval {
        id: EventId,
        start: DateTime<Utc>,
        stage: Stage,
    },
}

impl PipelineError {
    pub fn malformed(id: &EventId, stage: Stage, reason: impl Into<String>) -> Self {
        PipelineError::MalformedRecord {
            id: Some(id.clone()),
            stage,
            reason: reason.into(),
        }
    }

    /// Id of the record that triggered the failure.
    pub fn record_id(&self) -> Option<&EventId> {
        match self {
            PipelineError::MalformedRecord { id, .. } => id.as_ref(),
            PipelineError::AmbiguousJoin { second, .. } => Some(second),
            PipelineError::UnresolvedInterval { id, .. } => Some(id),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MalformedRecord { stage, .. }
            | PipelineError::AmbiguousJoin { stage, .. }
            | PipelineError::UnresolvedInterval { stage, .. } => *stage,
        }
    }

    /// Short name of the violated invariant.
    pub fn invariant(&self) -> &'static str {
        match self {
            PipelineError::MalformedRecord { .. } => "required fields present",
            PipelineError::AmbiguousJoin { .. } => "at most one wizard per bolus",
            PipelineError::UnresolvedInterval { .. } => "non-terminal basal segments resolve an end",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_without_id_uses_placeholder() {
        let error = PipelineError::MalformedRecord {
            id: None,
            stage: Stage::Decode,
            reason: "missing field `id`".to_string(),
        };
        insta::assert_snapshot!(
            error.to_string(),
            @"malformed record <no id> in decode: missing field `id`"
        );
        assert_eq!(error.record_id(), None);
        assert_eq!(error.stage(), Stage::Decode);
    }

    #[test]
    fn ambiguous_join_reports_the_second_claim() {
        let error = PipelineError::AmbiguousJoin {
            bolus_id: EventId::new("b1").unwrap(),
            first: EventId::new("w1").unwrap(),
            second: EventId::new("w2").unwrap(),
            stage: Stage::WizardReshaper,
        };
        insta::assert_snapshot!(
            error.to_string(),
            @"ambiguous join in wizard_reshaper: bolus b1 is claimed by wizard w1 and wizard w2"
        );
        assert_eq!(error.record_id().map(EventId::as_str), Some("w2"));
        assert_eq!(error.invariant(), "at most one wizard per bolus");
    }

    #[test]
    fn stage_names_match_serialized_form() {
        for stage in Stage::ALL {
            let encoded = serde_json::to_value(stage).unwrap();
            assert_eq!(encoded, stage.as_str());
        }
    }
}
