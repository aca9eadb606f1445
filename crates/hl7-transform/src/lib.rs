//! HL7 v2 message transformation.
//!
//! A [`Mapping`] is an ordered list of (target field, [`Operation`]) entries.
//! [`TransformExecutor`] applies it to a [`hl7_model::Message`], entry by
//! entry, writing each computed value into its target field.
//!
//! # Example
//!
//! ```ignore
//! use hl7_transform::{Mapping, MappingEntry, Operation, TransformExecutor};
//!
//! let mapping: Mapping = entries.into_iter().collect();
//! let executor = TransformExecutor::new(mapping);
//! executor.execute(&mut message)?;
//! ```
//!
//! Generating operations (`generate_*`) draw time and randomness from a
//! [`ValueSource`] supplied when the operation is built.

mod error;
mod executor;
mod operations;
mod source;

pub use error::{ExecutionError, OperationConstructionError, TransformExecutionError};
pub use executor::{Mapping, MappingEntry, TransformExecutor, TransformState};
pub use operations::{
    ALPHANUMERIC_ID_LENGTH, DATETIME_FORMAT, DATETIME_MINUTES_FORMAT, NUMERIC_ID_DIGITS,
    NumberType, OPERATIONS, Operation, OperationInfo, operation_names,
};
pub use source::{FixedValueSource, SystemValueSource, ValueSource};
