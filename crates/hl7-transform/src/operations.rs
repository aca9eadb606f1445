//! Field-level operations.
//!
//! Every mapping entry carries one [`Operation`] that computes the value to
//! write into its target field. Operations are resolved by name through a
//! fixed registry ([`OPERATIONS`]) when the mapping is loaded, so argument and
//! arity problems surface before any message is touched.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use hl7_model::{FieldAddress, Message};

use crate::error::{ExecutionError, OperationConstructionError, Result};
use crate::source::ValueSource;

/// HL7 timestamp with seconds precision.
pub const DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// HL7 timestamp with minutes precision.
pub const DATETIME_MINUTES_FORMAT: &str = "%Y%m%d%H%M";

/// Number of hex characters produced by `generate_alphanumeric_id`.
pub const ALPHANUMERIC_ID_LENGTH: usize = 32;

/// Number of digits produced by `generate_numeric_id`.
pub const NUMERIC_ID_DIGITS: usize = 9;

const NUMERIC_ID_MODULUS: u64 = 1_000_000_000;

/// Registry entry describing one operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub sources: &'static str,
    pub args: &'static str,
}

/// All operations that can appear in a mapping, in documentation order.
pub const OPERATIONS: &[OperationInfo] = &[
    OperationInfo {
        name: "copy_value",
        description: "Copy the value of another field",
        sources: "exactly 1",
        args: "-",
    },
    OperationInfo {
        name: "add_values",
        description: "Sum field values under a numeric type",
        sources: "0 or more",
        args: "type: int | float | str",
    },
    OperationInfo {
        name: "set_value",
        description: "Set a constant value",
        sources: "-",
        args: "value",
    },
    OperationInfo {
        name: "concatenate_values",
        description: "Join field values with a separator",
        sources: "0 or more",
        args: "separator",
    },
    OperationInfo {
        name: "generate_alphanumeric_id",
        description: "Random 32 character hexadecimal identifier",
        sources: "-",
        args: "-",
    },
    OperationInfo {
        name: "generate_numeric_id",
        description: "Random 9 digit zero-padded identifier",
        sources: "-",
        args: "-",
    },
    OperationInfo {
        name: "generate_current_datetime",
        description: "Current time as YYYYMMDDHHMMSS",
        sources: "-",
        args: "-",
    },
    OperationInfo {
        name: "set_end_time",
        description: "Start time plus a duration in minutes",
        sources: "exactly 2 (start, duration)",
        args: "-",
    },
];

/// Comma separated list of registered operation names.
pub fn operation_names() -> String {
    OPERATIONS
        .iter()
        .map(|info| info.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Numeric interpretation used by `add_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberType {
    Int,
    Float,
    /// Values are taken as text and must still read as numbers.
    Str,
}

impl NumberType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        }
    }
}

impl fmt::Display for NumberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level computation.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Constant value.
    SetValue { value: String },
    /// Value of another field.
    CopyValue { source: FieldAddress },
    /// Field values joined with a separator.
    Concatenate {
        sources: Vec<FieldAddress>,
        separator: String,
    },
    /// Sum of field values.
    AddValues {
        sources: Vec<FieldAddress>,
        number_type: NumberType,
    },
    GenerateAlphanumericId { values: Arc<dyn ValueSource> },
    GenerateNumericId { values: Arc<dyn ValueSource> },
    GenerateCurrentDatetime { values: Arc<dyn ValueSource> },
    /// Start timestamp plus a duration in minutes.
    SetEndTime {
        start: FieldAddress,
        duration: FieldAddress,
    },
}

impl Operation {
    /// Build an operation from its registry name.
    ///
    /// # Errors
    ///
    /// Fails on an unknown name, a wrong number of source fields, or a
    /// missing or invalid argument.
    pub fn from_name(
        name: &str,
        sources: Vec<FieldAddress>,
        args: &BTreeMap<String, String>,
        values: &Arc<dyn ValueSource>,
    ) -> std::result::Result<Self, OperationConstructionError> {
        let operation = match name {
            "set_value" => Self::SetValue {
                value: required_arg(args, "set_value", "value")?,
            },
            "copy_value" => {
                let [source] = exact_sources::<1>(sources, "copy_value")?;
                Self::CopyValue { source }
            }
            "concatenate_values" => Self::Concatenate {
                separator: required_arg(args, "concatenate_values", "separator")?,
                sources,
            },
            "add_values" => {
                let raw = required_arg(args, "add_values", "type")?;
                let number_type = NumberType::parse(raw.trim()).ok_or(
                    OperationConstructionError::InvalidArgument {
                        operation: "add_values",
                        argument: "type",
                        value: raw,
                        expected: "int, float, str",
                    },
                )?;
                Self::AddValues {
                    sources,
                    number_type,
                }
            }
            "generate_alphanumeric_id" => Self::GenerateAlphanumericId {
                values: Arc::clone(values),
            },
            "generate_numeric_id" => Self::GenerateNumericId {
                values: Arc::clone(values),
            },
            "generate_current_datetime" => Self::GenerateCurrentDatetime {
                values: Arc::clone(values),
            },
            "set_end_time" => {
                let [start, duration] = exact_sources::<2>(sources, "set_end_time")?;
                Self::SetEndTime { start, duration }
            }
            _ => {
                return Err(OperationConstructionError::UnknownOperation {
                    name: name.to_string(),
                    available: operation_names(),
                });
            }
        };
        Ok(operation)
    }

    /// Registry name of this operation.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetValue { .. } => "set_value",
            Self::CopyValue { .. } => "copy_value",
            Self::Concatenate { .. } => "concatenate_values",
            Self::AddValues { .. } => "add_values",
            Self::GenerateAlphanumericId { .. } => "generate_alphanumeric_id",
            Self::GenerateNumericId { .. } => "generate_numeric_id",
            Self::GenerateCurrentDatetime { .. } => "generate_current_datetime",
            Self::SetEndTime { .. } => "set_end_time",
        }
    }

    /// Fields this operation reads, in order.
    pub fn sources(&self) -> Vec<&FieldAddress> {
        match self {
            Self::CopyValue { source } => vec![source],
            Self::Concatenate { sources, .. } | Self::AddValues { sources, .. } => {
                sources.iter().collect()
            }
            Self::SetEndTime { start, duration } => vec![start, duration],
            Self::SetValue { .. }
            | Self::GenerateAlphanumericId { .. }
            | Self::GenerateNumericId { .. }
            | Self::GenerateCurrentDatetime { .. } => Vec::new(),
        }
    }

    /// Compute the value for the target field.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures of source fields and rejects source values
    /// that cannot be interpreted (numbers, timestamps).
    pub fn execute(&self, message: &Message) -> Result<String> {
        match self {
            Self::SetValue { value } => Ok(value.clone()),
            Self::CopyValue { source } => Ok(message.get(source)?),
            Self::Concatenate { sources, separator } => {
                let values = sources
                    .iter()
                    .map(|source| message.get(source))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(values.join(separator.as_str()))
            }
            Self::AddValues {
                sources,
                number_type,
            } => add_values(message, sources, *number_type),
            Self::GenerateAlphanumericId { values } => {
                let mut bytes = [0u8; ALPHANUMERIC_ID_LENGTH / 2];
                values.fill_bytes(&mut bytes);
                Ok(hex::encode(bytes))
            }
            Self::GenerateNumericId { values } => {
                let mut bytes = [0u8; 8];
                values.fill_bytes(&mut bytes);
                let number = u64::from_le_bytes(bytes) % NUMERIC_ID_MODULUS;
                Ok(format!("{number:0width$}", width = NUMERIC_ID_DIGITS))
            }
            Self::GenerateCurrentDatetime { values } => {
                Ok(values.now().format(DATETIME_FORMAT).to_string())
            }
            Self::SetEndTime { start, duration } => set_end_time(message, start, duration),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name())
    }
}

fn required_arg(
    args: &BTreeMap<String, String>,
    operation: &'static str,
    argument: &'static str,
) -> std::result::Result<String, OperationConstructionError> {
    args.get(argument)
        .cloned()
        .ok_or(OperationConstructionError::MissingArgument {
            operation,
            argument,
        })
}

fn exact_sources<const N: usize>(
    sources: Vec<FieldAddress>,
    operation: &'static str,
) -> std::result::Result<[FieldAddress; N], OperationConstructionError> {
    let actual = sources.len();
    sources
        .try_into()
        .map_err(|_| OperationConstructionError::Arity {
            operation,
            expected: N,
            actual,
        })
}

/// Running total for `add_values`. Integers stay exact until a float shows up.
#[derive(Debug, Clone, Copy)]
enum Sum {
    Int(i64),
    Float(f64),
}

impl Sum {
    fn checked_add(self, other: Sum) -> Option<Sum> {
        match (self, other) {
            (Sum::Int(a), Sum::Int(b)) => a.checked_add(b).map(Sum::Int),
            (Sum::Int(a), Sum::Float(b)) => Some(Sum::Float(a as f64 + b)),
            (Sum::Float(a), Sum::Int(b)) => Some(Sum::Float(a + b as f64)),
            (Sum::Float(a), Sum::Float(b)) => Some(Sum::Float(a + b)),
        }
    }

    fn render(self) -> String {
        match self {
            Sum::Int(value) => value.to_string(),
            Sum::Float(value) => format_float(value),
        }
    }
}

fn add_values(
    message: &Message,
    sources: &[FieldAddress],
    number_type: NumberType,
) -> Result<String> {
    let start = match number_type {
        NumberType::Float => Sum::Float(0.0),
        NumberType::Int | NumberType::Str => Sum::Int(0),
    };
    let mut total = start;
    for source in sources {
        let raw = message.get(source)?;
        let value = parse_number(&raw, number_type).ok_or_else(|| ExecutionError::InvalidValue {
            field: source.to_string(),
            value: raw.clone(),
            expected: match number_type {
                NumberType::Int => "integer",
                NumberType::Float | NumberType::Str => "number",
            },
        })?;
        total = total.checked_add(value).ok_or(ExecutionError::Overflow {
            operation: "add_values",
        })?;
    }
    Ok(total.render())
}

fn parse_number(raw: &str, number_type: NumberType) -> Option<Sum> {
    let trimmed = raw.trim();
    match number_type {
        NumberType::Int => trimmed.parse::<i64>().ok().map(Sum::Int),
        NumberType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Sum::Float),
        NumberType::Str => trimmed.parse::<i64>().ok().map(Sum::Int).or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Sum::Float)
        }),
    }
}

/// Render a float the way HL7 senders expect: integral values keep one decimal.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn set_end_time(
    message: &Message,
    start: &FieldAddress,
    duration: &FieldAddress,
) -> Result<String> {
    let start_raw = message.get(start)?;
    let (format, padded) = if start_raw.len() == 12 {
        (DATETIME_MINUTES_FORMAT, format!("{start_raw}00"))
    } else {
        (DATETIME_FORMAT, start_raw.clone())
    };
    let start_time = NaiveDateTime::parse_from_str(&padded, DATETIME_FORMAT).map_err(|_| {
        ExecutionError::InvalidValue {
            field: start.to_string(),
            value: start_raw.clone(),
            expected: "timestamp (YYYYMMDDHHMM[SS])",
        }
    })?;

    let duration_raw = message.get(duration)?;
    let minutes = duration_raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ExecutionError::InvalidValue {
            field: duration.to_string(),
            value: duration_raw.clone(),
            expected: "integer number of minutes",
        })?;

    let end_time = TimeDelta::try_minutes(minutes)
        .and_then(|delta| start_time.checked_add_signed(delta))
        .ok_or(ExecutionError::Overflow {
            operation: "set_end_time",
        })?;
    Ok(end_time.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_rendering_keeps_decimal() {
        assert_eq!(format_float(15.0), "15.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-0.25), "-0.25");
    }

    #[test]
    fn number_type_names_round_trip() {
        for number_type in [NumberType::Int, NumberType::Float, NumberType::Str] {
            assert_eq!(NumberType::parse(number_type.as_str()), Some(number_type));
        }
        assert_eq!(NumberType::parse("decimal"), None);
    }

    #[test]
    fn registry_names_are_constructible() {
        let values: Arc<dyn ValueSource> = Arc::new(crate::source::SystemValueSource::seeded(1));
        let mut args = BTreeMap::new();
        args.insert("value".to_string(), "x".to_string());
        args.insert("separator".to_string(), " ".to_string());
        args.insert("type".to_string(), "int".to_string());
        for info in OPERATIONS {
            let sources = match info.name {
                "copy_value" => vec![FieldAddress::parse("PID.3").unwrap()],
                "set_end_time" => vec![
                    FieldAddress::parse("SCH.11.4").unwrap(),
                    FieldAddress::parse("SCH.11.3").unwrap(),
                ],
                _ => Vec::new(),
            };
            let operation = Operation::from_name(info.name, sources, &args, &values).unwrap();
            assert_eq!(operation.name(), info.name);
        }
    }
}
