//! Tests for individual operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use hl7_model::{AccessError, FieldAddress, Message};
use hl7_transform::{
    ExecutionError, FixedValueSource, Operation, OperationConstructionError, SystemValueSource,
    ValueSource,
};

const SIU_S12: &str = "MSH|^~\\&|SENDER|FAC|RECEIVER|FAC|20200520120000||SIU^S12|MSG0001|P|2.5\n\
                       SCH|1001|2002||||ROUTINE|||||202005201615^^20^202005201615\n\
                       AIL|1||ROOM 12^^^CLINIC\n\
                       NTE|1||10|5|2.5|abc";

fn message() -> Message {
    Message::parse(SIU_S12).unwrap()
}

fn addresses(paths: &[&str]) -> Vec<FieldAddress> {
    paths
        .iter()
        .map(|p| FieldAddress::parse(p).unwrap())
        .collect()
}

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn fixed_source() -> Arc<dyn ValueSource> {
    let now = NaiveDate::from_ymd_opt(2020, 5, 20)
        .unwrap()
        .and_hms_opt(16, 15, 42)
        .unwrap();
    Arc::new(FixedValueSource::new(now, 0x5a))
}

fn build(name: &str, sources: &[&str], pairs: &[(&str, &str)]) -> Operation {
    Operation::from_name(name, addresses(sources), &args(pairs), &fixed_source()).unwrap()
}

fn build_err(name: &str, sources: &[&str], pairs: &[(&str, &str)]) -> OperationConstructionError {
    Operation::from_name(name, addresses(sources), &args(pairs), &fixed_source()).unwrap_err()
}

#[test]
fn set_value_returns_constant() {
    let op = build("set_value", &[], &[("value", "SIU^S12^SIU_S12")]);
    assert_eq!(op.execute(&message()).unwrap(), "SIU^S12^SIU_S12");
}

#[test]
fn set_value_requires_value() {
    assert_eq!(
        build_err("set_value", &[], &[]),
        OperationConstructionError::MissingArgument {
            operation: "set_value",
            argument: "value",
        }
    );
}

#[test]
fn copy_value_reads_source() {
    let op = build("copy_value", &["SCH.11.4"], &[]);
    assert_eq!(op.execute(&message()).unwrap(), "202005201615");
}

#[test]
fn copy_value_rejects_two_sources() {
    assert_eq!(
        build_err("copy_value", &["SCH.11.4", "SCH.11.3"], &[]),
        OperationConstructionError::Arity {
            operation: "copy_value",
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn copy_value_propagates_missing_field() {
    let op = build("copy_value", &["NTE.9"], &[]);
    assert!(matches!(
        op.execute(&message()),
        Err(ExecutionError::Access(AccessError::FieldNotFound { .. }))
    ));
}

#[test]
fn concatenate_joins_in_order() {
    let op = build(
        "concatenate_values",
        &["SCH.11.4", "SCH.11.3"],
        &[("separator", " + ")],
    );
    assert_eq!(op.execute(&message()).unwrap(), "202005201615 + 20");
}

#[test]
fn concatenate_without_sources_is_empty() {
    let op = build("concatenate_values", &[], &[("separator", "-")]);
    assert_eq!(op.execute(&message()).unwrap(), "");
}

#[test]
fn add_values_int() {
    let op = build("add_values", &["NTE.3", "NTE.4"], &[("type", "int")]);
    assert_eq!(op.execute(&message()).unwrap(), "15");
}

#[test]
fn add_values_float() {
    let op = build("add_values", &["NTE.3", "NTE.5"], &[("type", "float")]);
    assert_eq!(op.execute(&message()).unwrap(), "12.5");

    let whole = build("add_values", &["NTE.3", "NTE.4"], &[("type", "float")]);
    assert_eq!(whole.execute(&message()).unwrap(), "15.0");
}

#[test]
fn add_values_str_requires_numbers() {
    let op = build("add_values", &["NTE.3", "NTE.4"], &[("type", "str")]);
    assert_eq!(op.execute(&message()).unwrap(), "15");

    let bad = build("add_values", &["NTE.3", "NTE.6"], &[("type", "str")]);
    assert!(matches!(
        bad.execute(&message()),
        Err(ExecutionError::InvalidValue { .. })
    ));
}

#[test]
fn add_values_int_rejects_fraction() {
    let op = build("add_values", &["NTE.5"], &[("type", "int")]);
    assert!(matches!(
        op.execute(&message()),
        Err(ExecutionError::InvalidValue {
            expected: "integer",
            ..
        })
    ));
}

#[test]
fn add_values_rejects_unknown_type() {
    assert!(matches!(
        build_err("add_values", &["NTE.3"], &[("type", "decimal")]),
        OperationConstructionError::InvalidArgument { argument: "type", .. }
    ));
    assert!(matches!(
        build_err("add_values", &["NTE.3"], &[]),
        OperationConstructionError::MissingArgument { argument: "type", .. }
    ));
}

#[test]
fn set_end_time_minutes_precision() {
    let op = build("set_end_time", &["SCH.11.4", "SCH.11.3"], &[]);
    assert_eq!(op.execute(&message()).unwrap(), "202005201635");
}

#[test]
fn set_end_time_seconds_precision() {
    let mut msg = message();
    msg.set(&FieldAddress::parse("SCH.11.4").unwrap(), "20200520235950");
    msg.set(&FieldAddress::parse("SCH.11.3").unwrap(), "30");
    let op = build("set_end_time", &["SCH.11.4", "SCH.11.3"], &[]);
    assert_eq!(op.execute(&msg).unwrap(), "20200521002950");
}

#[test]
fn set_end_time_rejects_bad_inputs() {
    let op = build("set_end_time", &["AIL.3", "SCH.11.3"], &[]);
    assert!(matches!(
        op.execute(&message()),
        Err(ExecutionError::InvalidValue { .. })
    ));

    let op = build("set_end_time", &["SCH.11.4", "AIL.3.1"], &[]);
    assert!(matches!(
        op.execute(&message()),
        Err(ExecutionError::InvalidValue { .. })
    ));
}

#[test]
fn set_end_time_requires_two_sources() {
    assert!(matches!(
        build_err("set_end_time", &["SCH.11.4"], &[]),
        OperationConstructionError::Arity { expected: 2, actual: 1, .. }
    ));
}

#[test]
fn generators_use_injected_source() {
    let msg = message();
    assert_eq!(
        build("generate_current_datetime", &[], &[]).execute(&msg).unwrap(),
        "20200520161542"
    );
    assert_eq!(
        build("generate_alphanumeric_id", &[], &[]).execute(&msg).unwrap(),
        "5a".repeat(16)
    );

    let numeric = build("generate_numeric_id", &[], &[]).execute(&msg).unwrap();
    assert_eq!(numeric.len(), 9);
    assert!(numeric.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn generated_ids_differ_per_invocation() {
    let values: Arc<dyn ValueSource> = Arc::new(SystemValueSource::seeded(42));
    let op = Operation::from_name("generate_alphanumeric_id", Vec::new(), &BTreeMap::new(), &values)
        .unwrap();
    let msg = message();
    let first = op.execute(&msg).unwrap();
    let second = op.execute(&msg).unwrap();
    assert_eq!(first.len(), 32);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first, second);
}

#[test]
fn unknown_operation_lists_valid_names() {
    let err = build_err("delete_segment", &[], &[]);
    let msg = err.to_string();
    assert!(msg.starts_with("delete_segment is not a valid operation name"));
    assert!(msg.contains("copy_value"));
    assert!(msg.contains("set_end_time"));
}

#[test]
fn display_shows_name() {
    assert_eq!(
        build("generate_current_datetime", &[], &[]).to_string(),
        "<generate_current_datetime>"
    );
}
