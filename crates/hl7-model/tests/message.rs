//! Integration tests for ER7 parsing and serialization.

use std::io::Write;

use hl7_model::{Message, ModelError};

#[test]
fn accepts_carriage_return_delimiters() {
    let message = Message::parse("MSH|^~\\&|A\r\nPID|1\rPV1|1|O\n\n").unwrap();
    assert_eq!(message.segment_count(), 3);
    assert_eq!(message.to_er7(), "MSH|^~\\&|A\nPID|1\nPV1|1|O");
}

#[test]
fn message_without_header_uses_defaults() {
    let message = Message::parse("PID|1||X^Y").unwrap();
    assert_eq!(message.field_separator(), '|');
    assert_eq!(message.component_separator(), '^');
}

#[test]
fn new_message_is_empty() {
    let message = Message::new();
    assert_eq!(message.segment_count(), 0);
    assert_eq!(message.to_er7(), "");
}

#[test]
fn from_file_trims_and_parses() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "MSH|^~\\&|APP|FAC").unwrap();
    writeln!(file, "PID|1||42").unwrap();
    writeln!(file).unwrap();

    let message = Message::from_file(file.path()).unwrap();
    assert_eq!(message.segment_count(), 2);
}

#[test]
fn from_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Message::from_file(&dir.path().join("missing.hl7")).unwrap_err();
    assert!(matches!(err, ModelError::Io { .. }));
}
