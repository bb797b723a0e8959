//! Batch loading.
//!
//! A batch is either a single JSON array of records or a stream of JSON
//! objects, conventionally one per line. The layout is detected from the
//! first non-whitespace character.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::{Deserializer, Value};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Layout of a raw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFormat {
    JsonArray,
    Ndjson,
}

impl BatchFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchFormat::JsonArray => "json_array",
            BatchFormat::Ndjson => "ndjson",
        }
    }
}

impl fmt::Display for BatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw records as supplied by the remote store, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub format: BatchFormat,
    pub records: Vec<Value>,
}

impl RawBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses a batch from text.
pub fn parse_batch(text: &str) -> Result<RawBatch> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let trimmed = text.trim_start();
    let batch = match trimmed.chars().next() {
        Some('[') => {
            let root: Value = serde_json::from_str(trimmed).map_err(IngestError::parse)?;
            let records = match root {
                Value::Array(records) => records,
                other => {
                    return Err(IngestError::UnsupportedRoot {
                        found: json_kind(&other),
                    });
                }
            };
            RawBatch {
                format: BatchFormat::JsonArray,
                records: check_objects(records)?,
            }
        }
        Some('{') | None => {
            let records = Deserializer::from_str(text)
                .into_iter::<Value>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(IngestError::parse)?;
            RawBatch {
                format: BatchFormat::Ndjson,
                records: check_objects(records)?,
            }
        }
        Some(_) => {
            let root: Value = serde_json::from_str(trimmed).map_err(IngestError::parse)?;
            return Err(IngestError::UnsupportedRoot {
                found: json_kind(&root),
            });
        }
    };
    debug!(format = %batch.format, records = batch.len(), "batch parsed");
    Ok(batch)
}

/// Reads and parses a batch from any reader.
pub fn read_batch_from<R: Read>(mut reader: R) -> Result<RawBatch> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(IngestError::Read)?;
    parse_batch(&text)
}

/// Reads and parses a batch file.
pub fn read_batch(path: &Path) -> Result<RawBatch> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => IngestError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let batch = parse_batch(&text)?;
    debug!(path = %path.display(), records = batch.len(), "batch loaded");
    Ok(batch)
}

fn check_objects(records: Vec<Value>) -> Result<Vec<Value>> {
    if let Some((index, record)) = records
        .iter()
        .enumerate()
        .find(|(_, record)| !record.is_object())
    {
        return Err(IngestError::NotAnObject {
            index,
            found: json_kind(record),
        });
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_json_array() {
        let batch = parse_batch(r#"  [{"id": "a"}, {"id": "b"}]"#).unwrap();
        assert_eq!(batch.format, BatchFormat::JsonArray);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_detects_ndjson_and_skips_blank_lines() {
        let batch = parse_batch("{\"id\": \"a\"}\n\n{\"id\": \"b\"}\n").unwrap();
        assert_eq!(batch.format, BatchFormat::Ndjson);
        assert_eq!(batch.records[1]["id"], "b");
    }

    #[test]
    fn test_empty_input_is_an_empty_batch() {
        let batch = parse_batch(" \n").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let batch = parse_batch("\u{feff}[{\"id\": \"a\"}]").unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_rejects_scalar_root() {
        let error = parse_batch("42").unwrap_err();
        assert!(matches!(error, IngestError::UnsupportedRoot { found: "a number" }));
    }

    #[test]
    fn test_rejects_non_object_records() {
        let error = parse_batch(r#"[{"id": "a"}, "b"]"#).unwrap_err();
        assert!(matches!(error, IngestError::NotAnObject { index: 1, found: "a string" }));
    }
}
