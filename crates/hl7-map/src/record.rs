//! Mapping records as they appear in mapping files.

use std::collections::BTreeMap;
use std::sync::Arc;

use hl7_model::FieldAddress;
use hl7_transform::{MappingEntry, Operation, ValueSource};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{MappingLoadError, Result};

/// One mapping definition before it is resolved into a [`MappingEntry`].
///
/// ```json
/// {
///     "target_field": "TQ1.8",
///     "operation": "add_values",
///     "source_fields": ["SCH.11.4", "SCH.11.3"],
///     "args": {"type": "int"}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub target_field: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_fields: Option<Vec<String>>,
    /// Operation arguments; scalar JSON values are kept as their text form.
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: BTreeMap<String, String>,
}

impl MappingRecord {
    /// Source paths in order, from either `source_field` or `source_fields`.
    pub fn source_paths(&self, index: usize) -> Result<Vec<&str>> {
        match (&self.source_field, &self.source_fields) {
            (Some(_), Some(_)) => Err(MappingLoadError::InvalidRecord {
                index,
                reason: "both source_field and source_fields are set".to_string(),
            }),
            (Some(single), None) => Ok(vec![single.as_str()]),
            (None, Some(many)) => Ok(many.iter().map(String::as_str).collect()),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// Resolve addresses and build the operation.
    ///
    /// `index` is the record's position in the mapping and is only used for
    /// error reporting.
    pub fn into_entry(self, index: usize, values: &Arc<dyn ValueSource>) -> Result<MappingEntry> {
        if self.operation.trim().is_empty() {
            return Err(MappingLoadError::InvalidRecord {
                index,
                reason: "missing operation".to_string(),
            });
        }
        let target = parse_address(&self.target_field, index)?;
        let sources = self
            .source_paths(index)?
            .into_iter()
            .map(|path| parse_address(path, index))
            .collect::<Result<Vec<_>>>()?;
        let operation = Operation::from_name(self.operation.trim(), sources, &self.args, values)
            .map_err(|source| MappingLoadError::Operation { index, source })?;
        Ok(MappingEntry::new(target, operation))
    }
}

fn parse_address(path: &str, index: usize) -> Result<FieldAddress> {
    FieldAddress::parse(path.trim()).map_err(|source| MappingLoadError::Address { index, source })
}

fn deserialize_args<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut args = BTreeMap::new();
    for (key, value) in raw {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(serde::de::Error::custom(format!(
                    "argument '{key}' must be a string, number or boolean"
                )));
            }
        };
        args.insert(key, text);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_args_become_text() {
        let record: MappingRecord = serde_json::from_str(
            r#"{"target_field": "ORC.7.6", "operation": "set_value",
                "args": {"value": 6, "flag": true, "skip": null}}"#,
        )
        .unwrap();
        assert_eq!(record.args.get("value").map(String::as_str), Some("6"));
        assert_eq!(record.args.get("flag").map(String::as_str), Some("true"));
        assert!(!record.args.contains_key("skip"));
    }

    #[test]
    fn nested_args_are_rejected() {
        let result = serde_json::from_str::<MappingRecord>(
            r#"{"target_field": "PID.3", "operation": "set_value", "args": {"value": [1, 2]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn conflicting_sources_are_rejected() {
        let record = MappingRecord {
            target_field: "PV1.2".to_string(),
            operation: "copy_value".to_string(),
            source_field: Some("PID.18".to_string()),
            source_fields: Some(vec!["PID.19".to_string()]),
            args: BTreeMap::new(),
        };
        assert!(matches!(
            record.source_paths(0),
            Err(MappingLoadError::InvalidRecord { index: 0, .. })
        ));
    }
}
