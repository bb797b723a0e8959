//! Wizard/bolus join.
//!
//! A wizard record names the bolus it produced. When that bolus is in the
//! same batch, the wizard's inputs and recommendation are attached to it and
//! the wizard record is absorbed. Wizards whose bolus is elsewhere pass
//! through unchanged.
//!
//! The join needs the whole batch, so this stage drains its input on first
//! use. Every other stage stays one record at a time.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use devdata_model::{DeviceEvent, EventId, EventPayload, WizardAnnotation};

use crate::error::{PipelineError, Result, Stage};

/// Joins wizards onto the boluses they reference.
///
/// Fails with [`PipelineError::AmbiguousJoin`] when two wizards reference the
/// same bolus id, or when a wizard claims a bolus that already carries a
/// different wizard's annotation.
pub fn join_wizards(events: Vec<DeviceEvent>) -> Result<Vec<DeviceEvent>> {
    // bolus id -> claiming wizard id
    let mut claims: HashMap<&EventId, &EventId> = HashMap::new();
    for event in &events {
        let Some(bolus_id) = event.as_wizard().and_then(|record| record.bolus_id()) else {
            continue;
        };
        if let Some(first) = claims.insert(bolus_id, &event.id) {
            return Err(ambiguous(bolus_id, first, &event.id));
        }
    }

    let mut boluses: HashSet<&EventId> = HashSet::new();
    for event in &events {
        let Some(dose) = event.as_bolus() else {
            continue;
        };
        boluses.insert(&event.id);
        if let (Some(existing), Some(claim)) = (&dose.wizard, claims.get(&event.id))
            && existing.wizard_id != **claim
        {
            return Err(ambiguous(&event.id, &existing.wizard_id, claim));
        }
    }

    let mut annotations: HashMap<EventId, WizardAnnotation> = HashMap::new();
    // positions, not ids: two wizards may share an id
    let mut absorbed: HashSet<usize> = HashSet::new();
    for (position, event) in events.iter().enumerate() {
        let Some(record) = event.as_wizard() else {
            continue;
        };
        match record.bolus_id() {
            Some(bolus_id) if boluses.contains(bolus_id) => {
                annotations.insert(bolus_id.clone(), record.annotation(event.id.clone()));
                absorbed.insert(position);
            }
            _ => debug!(id = %event.id, "wizard has no bolus in this batch; keeping it standalone"),
        }
    }

    let mut joined = Vec::with_capacity(events.len() - absorbed.len());
    for (position, mut event) in events.into_iter().enumerate() {
        match &mut event.payload {
            EventPayload::Wizard(_) if absorbed.contains(&position) => continue,
            EventPayload::Bolus(dose) => {
                if let Some(annotation) = annotations.remove(&event.id) {
                    dose.wizard = Some(annotation);
                }
            }
            _ => {}
        }
        joined.push(event);
    }
    Ok(joined)
}

fn ambiguous(bolus_id: &EventId, first: &EventId, second: &EventId) -> PipelineError {
    PipelineError::AmbiguousJoin {
        bolus_id: bolus_id.clone(),
        first: first.clone(),
        second: second.clone(),
        stage: Stage::WizardReshaper,
    }
}

/// Adapter applying [`join_wizards`] to the whole upstream batch.
pub struct WizardReshaper<I> {
    inner: Option<I>,
    joined: std::vec::IntoIter<DeviceEvent>,
}

impl<I> WizardReshaper<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner: Some(inner),
            joined: Vec::new().into_iter(),
        }
    }
}

impl<I> Iterator for WizardReshaper<I>
where
    I: Iterator<Item = Result<DeviceEvent>>,
{
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(inner) = self.inner.take() {
            match inner.collect::<Result<Vec<_>>>().and_then(join_wizards) {
                Ok(events) => self.joined = events.into_iter(),
                Err(error) => return Some(Err(error)),
            }
        }
        self.joined.next().map(Ok)
    }
}
