//! Error types for mapping loading.

use std::path::PathBuf;

use hl7_model::AddressParseError;
use hl7_transform::OperationConstructionError;
use thiserror::Error;

/// Errors that can occur while loading a mapping.
#[derive(Debug, Error)]
pub enum MappingLoadError {
    // === File System Errors ===
    /// Failed to read the mapping file.
    #[error("failed to read mapping file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping type is neither `json` nor `csv`.
    #[error("unsupported mapping file type '{format}'. Currently supported are: json, csv")]
    UnsupportedFormat { format: String },

    // === Parsing Errors ===
    /// JSON document is not an array of mapping records.
    #[error("invalid JSON mapping: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV table could not be read.
    #[error("invalid CSV mapping: {0}")]
    Csv(#[from] csv::Error),

    // === Record Errors ===
    /// Record is structurally wrong (missing column, conflicting sources).
    #[error("mapping record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Target or source path is malformed.
    #[error("mapping record {index}: {source}")]
    Address {
        index: usize,
        #[source]
        source: AddressParseError,
    },

    /// Operation name or arguments rejected.
    #[error("mapping record {index}: {source}")]
    Operation {
        index: usize,
        #[source]
        source: OperationConstructionError,
    },
}

/// Result type for mapping loading.
pub type Result<T> = std::result::Result<T, MappingLoadError>;
