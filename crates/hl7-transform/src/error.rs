//! Error types for operations and transform execution.

use hl7_model::{AccessError, AddressParseError, FieldAddress};
use thiserror::Error;

/// An operation could not be built from its name, sources and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationConstructionError {
    #[error("{name} is not a valid operation name. Available operations are: {available}")]
    UnknownOperation { name: String, available: String },

    #[error("{operation} expects {expected} source field(s), got {actual}")]
    Arity {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{operation} requires argument '{argument}'")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },

    #[error(
        "{operation}: invalid value '{value}' for argument '{argument}' \
         (expected one of: {expected})"
    )]
    InvalidArgument {
        operation: &'static str,
        argument: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid source field: {0}")]
    Address(#[from] AddressParseError),
}

/// An operation failed while computing its value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("value '{value}' of {field} is not a valid {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("numeric overflow while computing {operation}")]
    Overflow { operation: &'static str },
}

/// Applying one mapping entry failed; earlier entries stay applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error occurred during processing of {target} (entry {index}): {cause}")]
pub struct TransformExecutionError {
    pub target: FieldAddress,
    pub index: usize,
    #[source]
    pub cause: ExecutionError,
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
