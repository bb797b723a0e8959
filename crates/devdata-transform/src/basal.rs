//! Basal interval reconstruction.
//!
//! Each basal segment runs until the next basal segment in the stream starts.
//! The reshaper therefore holds one segment back until its successor arrives.
//! Non-basal records seen while a segment is pending are held behind it, so
//! the stream leaves this stage in exactly the order it entered.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use devdata_model::{BasalSegment, DeliveryType, DeviceEvent};

use crate::error::{PipelineError, Result, Stage};

struct PendingSegment {
    event: DeviceEvent,
    start: DateTime<Utc>,
}

/// Lazy adapter that resolves `start`/`end` on every basal segment.
pub struct BasalReshaper<I> {
    inner: I,
    pending: Option<PendingSegment>,
    held: VecDeque<DeviceEvent>,
    ready: VecDeque<DeviceEvent>,
    warn_on_truncation: bool,
    finished: bool,
}

impl<I> BasalReshaper<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: None,
            held: VecDeque::new(),
            ready: VecDeque::new(),
            warn_on_truncation: false,
            finished: false,
        }
    }

    /// Log truncated segments at warn instead of debug.
    pub fn warn_on_truncation(mut self, enabled: bool) -> Self {
        self.warn_on_truncation = enabled;
        self
    }

    fn accept(&mut self, event: DeviceEvent) -> Result<()> {
        let Some(segment) = event.as_basal() else {
            if self.pending.is_some() {
                self.held.push_back(event);
            } else {
                self.ready.push_back(event);
            }
            return Ok(());
        };
        let start = validate_segment(&event, segment)?;
        self.flush(Some(start))?;
        self.pending = Some(PendingSegment { event, start });
        Ok(())
    }

    /// Closes the pending segment against `next_start` and releases it
    /// together with everything held behind it.
    fn flush(&mut self, next_start: Option<DateTime<Utc>>) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            let closed = self.close(pending, next_start)?;
            self.ready.push_back(closed);
        }
        self.ready.extend(self.held.drain(..));
        Ok(())
    }

    fn close(&self, pending: PendingSegment, next_start: Option<DateTime<Utc>>) -> Result<DeviceEvent> {
        let PendingSegment { mut event, start } = pending;
        let end = match event.as_basal() {
            Some(segment) => self.resolve_end(&event, segment, start, next_start)?,
            None => return Ok(event),
        };
        if let Some(segment) = event.as_basal_mut() {
            segment.start = Some(start);
            segment.end = end;
        }
        Ok(event)
    }

    fn resolve_end(
        &self,
        event: &DeviceEvent,
        segment: &BasalSegment,
        start: DateTime<Utc>,
        next_start: Option<DateTime<Utc>>,
    ) -> Result<Option<DateTime<Utc>>> {
        let programmed_end = segment
            .duration_delta()
            .and_then(|length| start.checked_add_signed(length));

        let Some(next_start) = next_start else {
            if programmed_end.is_none() {
                debug!(id = %event.id, %start, "final basal segment is open-ended");
            }
            return Ok(programmed_end);
        };

        if next_start < start {
            return match programmed_end {
                Some(end) => {
                    warn!(
                        id = %event.id,
                        %start,
                        %next_start,
                        "next basal segment starts earlier; using programmed duration"
                    );
                    Ok(Some(end))
                }
                None => Err(PipelineError::UnresolvedInterval {
                    id: event.id.clone(),
                    start,
                    stage: Stage::BasalReshaper,
                }),
            };
        }

        if let Some(programmed_end) = programmed_end {
            if programmed_end > next_start {
                let cut_ms = (programmed_end - next_start).num_milliseconds();
                if self.warn_on_truncation {
                    warn!(id = %event.id, cut_ms, "basal segment truncated by its successor");
                } else {
                    debug!(id = %event.id, cut_ms, "basal segment truncated by its successor");
                }
            } else if programmed_end < next_start {
                let gap_ms = (next_start - programmed_end).num_milliseconds();
                debug!(id = %event.id, gap_ms, "basal segment extended to bridge a gap");
            }
        }
        Ok(Some(next_start))
    }

    fn fail(&mut self, error: PipelineError) -> Option<Result<DeviceEvent>> {
        self.finished = true;
        self.pending = None;
        self.held.clear();
        self.ready.clear();
        Some(Err(error))
    }
}

/// Checks the fields interval resolution depends on and returns the start.
///
/// The segment's own `start` wins over the record `time` when both are set.
fn validate_segment(event: &DeviceEvent, segment: &BasalSegment) -> Result<DateTime<Utc>> {
    let malformed = |reason: String| PipelineError::malformed(&event.id, Stage::BasalReshaper, reason);

    let Some(start) = segment.start.or(event.time) else {
        return Err(malformed("basal segment has neither start nor time".to_string()));
    };
    if let (Some(recorded), Some(time)) = (segment.start, event.time)
        && recorded != time
    {
        debug!(id = %event.id, %recorded, %time, "basal start differs from record time; using start");
    }
    for link in std::iter::once(segment).chain(segment.suppressed_chain()) {
        for (field, value) in [("rate", link.rate), ("percent", link.percent)] {
            if value.is_some_and(|value| !value.is_finite() || value < 0.0) {
                return Err(malformed(format!(
                    "{} basal has an invalid {field}",
                    link.delivery_type
                )));
            }
        }
    }
    if segment.delivery_type == DeliveryType::Temp && segment.effective_rate().is_none() {
        return Err(malformed("temp basal has no derivable rate".to_string()));
    }
    if segment.duration.is_some()
        && segment
            .duration_delta()
            .and_then(|length| start.checked_add_signed(length))
            .is_none()
    {
        return Err(malformed("basal duration is out of range".to_string()));
    }
    Ok(start)
}

impl<I> Iterator for BasalReshaper<I>
where
    I: Iterator<Item = Result<DeviceEvent>>,
{
    type Item = Result<DeviceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            match self.inner.next() {
                Some(Ok(event)) => {
                    if let Err(error) = self.accept(event) {
                        return self.fail(error);
                    }
                }
                Some(Err(error)) => return self.fail(error),
                None => {
                    self.finished = true;
                    if let Err(error) = self.flush(None) {
                        return self.fail(error);
                    }
                }
            }
        }
    }
}
