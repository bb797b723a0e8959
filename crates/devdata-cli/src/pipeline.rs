//! Load, normalize and write one batch file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, trace};

use devdata_ingest::read_batch;
use devdata_model::{BasalSegment, DeviceEvent, ProcessingOptions};
use devdata_transform::Pipeline;

use crate::logging::redact_value;
use crate::types::NormalizeResult;

/// Inputs for [`normalize_file`].
#[derive(Debug, Clone)]
pub struct NormalizeFileInput<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub options: ProcessingOptions,
    pub pretty: bool,
}

/// Reads a raw batch, runs the pipeline over it and writes the result.
///
/// Nothing is written when normalization fails.
pub fn normalize_file(request: &NormalizeFileInput<'_>) -> Result<NormalizeResult> {
    let source_file = request.input.display().to_string();
    let file_span = info_span!("normalize_file", source_file = %source_file);
    let _file_guard = file_span.enter();

    let load_start = Instant::now();
    let raw = read_batch(request.input).with_context(|| format!("load {source_file}"))?;
    info!(
        format = %raw.format,
        records = raw.len(),
        duration_ms = load_start.elapsed().as_millis(),
        "data received"
    );

    let format = raw.format;
    let batch = Pipeline::new(request.options.clone())
        .run_values(raw.records)
        .with_context(|| format!("normalize {source_file}"))?;
    trace_records(&batch.events);

    match request.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create {}", path.display()))?;
            write_events(&batch.events, BufWriter::new(file), request.pretty)
                .with_context(|| format!("write {}", path.display()))?;
            debug!(path = %path.display(), records = batch.events.len(), "output written");
        }
        None => {
            let stdout = io::stdout();
            write_events(&batch.events, stdout.lock(), request.pretty).context("write stdout")?;
        }
    }

    Ok(NormalizeResult {
        input: request.input.to_path_buf(),
        format,
        output: request.output.map(Path::to_path_buf),
        batch,
    })
}

/// Writes records as one JSON array followed by a newline.
pub fn write_events<W: Write>(events: &[DeviceEvent], mut writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, events)?;
    } else {
        serde_json::to_writer(&mut writer, events)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn trace_records(events: &[DeviceEvent]) {
    if !tracing::enabled!(tracing::Level::TRACE) {
        return;
    }
    for event in events {
        let value = event
            .as_glucose()
            .map(|reading| reading.value.to_string())
            .or_else(|| {
                event
                    .as_bolus()
                    .map(|dose| dose.delivered_total().to_string())
            })
            .or_else(|| {
                event
                    .as_basal()
                    .and_then(BasalSegment::effective_rate)
                    .as_ref()
                    .map(ToString::to_string)
            });
        trace!(
            id = %event.id,
            kind = event.kind_name(),
            value = value.as_deref().map(redact_value),
            "normalized record"
        );
    }
}
