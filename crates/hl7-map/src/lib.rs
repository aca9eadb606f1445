//! Mapping files for HL7 transforms.
//!
//! Reads JSON or CSV mapping definitions and resolves them into a
//! [`hl7_transform::Mapping`] ready for the executor.

pub mod error;
pub mod loader;
pub mod record;

pub use error::{MappingLoadError, Result};
pub use loader::{ARGS_PREFIX, MappingFormat, MappingLoader, read_csv_records, read_json_records};
pub use record::MappingRecord;
