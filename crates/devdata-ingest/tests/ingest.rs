//! File-based ingestion tests.

use std::fs;
use std::io::Cursor;

use devdata_ingest::{BatchFormat, IngestError, read_batch, read_batch_from};

#[test]
fn test_reads_array_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    fs::write(
        &path,
        r#"[
  { "id": "c1", "type": "cbg", "time": "2014-03-06T09:00:00Z", "value": 5.4 },
  { "id": "d1", "type": "bolus", "time": "2014-03-06T09:10:00Z", "normal": 2.0 }
]"#,
    )
    .unwrap();

    let batch = read_batch(&path).unwrap();
    assert_eq!(batch.format, BatchFormat::JsonArray);
    assert_eq!(batch.records[0]["type"], "cbg");
    assert_eq!(batch.records[1]["normal"], 2.0);
}

#[test]
fn test_reads_ndjson_stream() {
    let input = "{\"id\":\"c1\",\"type\":\"cbg\",\"value\":5.4}\n{\"id\":\"c2\",\"type\":\"cbg\",\"value\":6.1}\n";
    let batch = read_batch_from(Cursor::new(input)).unwrap();
    assert_eq!(batch.format, BatchFormat::Ndjson);
    assert_eq!(batch.len(), 2);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let error = read_batch(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(error, IngestError::FileNotFound { .. }));
}

#[test]
fn test_parse_error_reports_position() {
    let error = read_batch_from(Cursor::new("{\"id\": \"a\"}\n{\"id\": }\n")).unwrap_err();
    let IngestError::Parse { line, .. } = error else {
        panic!("expected a parse error, got {error:?}");
    };
    assert_eq!(line, 2);
}

#[test]
fn test_error_messages() {
    let error = read_batch_from(Cursor::new("true")).unwrap_err();
    insta::assert_snapshot!(
        error.to_string(),
        @"unsupported batch root: expected an array of records or one record per line, found a boolean"
    );
}
