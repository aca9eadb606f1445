//! Reading mapping files into a [`Mapping`].
//!
//! Two layouts are supported:
//!
//! - **JSON**: an array of [`MappingRecord`] objects.
//! - **CSV**: one record per row. Columns `target_field`, `operation`,
//!   `source_field` and `source_fields` map directly; dotted headers such as
//!   `args.value` nest into `args`. Empty cells are treated as absent;
//!   argument cells are kept verbatim unless they are completely empty.
//!   `source_fields` lists paths separated by commas. Record indices count
//!   only non-blank rows.
//!
//! Every record is resolved into an operation while loading, so a bad mapping
//! is rejected before any message is read.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use csv::ReaderBuilder;
use hl7_transform::{Mapping, ValueSource};
use tracing::{debug, info, warn};

use crate::error::{MappingLoadError, Result};
use crate::record::MappingRecord;

/// Prefix of CSV columns that hold operation arguments.
pub const ARGS_PREFIX: &str = "args.";

/// Mapping file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingFormat {
    #[default]
    Json,
    Csv,
}

impl MappingFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Guess the layout from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        extension.to_ascii_lowercase().parse().ok()
    }
}

impl FromStr for MappingFormat {
    type Err = MappingLoadError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(MappingLoadError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for MappingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds [`Mapping`]s, handing every generating operation the same
/// [`ValueSource`].
#[derive(Debug, Clone)]
pub struct MappingLoader {
    values: Arc<dyn ValueSource>,
}

impl MappingLoader {
    pub fn new(values: Arc<dyn ValueSource>) -> Self {
        Self { values }
    }

    /// Load a mapping file in the given layout.
    pub fn load_file(&self, path: &Path, format: MappingFormat) -> Result<Mapping> {
        let text = std::fs::read_to_string(path).map_err(|source| MappingLoadError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mapping = self.load_str(&text, format)?;
        info!(
            path = %path.display(),
            format = %format,
            entries = mapping.len(),
            "mapping loaded"
        );
        Ok(mapping)
    }

    pub fn load_str(&self, text: &str, format: MappingFormat) -> Result<Mapping> {
        let records = match format {
            MappingFormat::Json => read_json_records(text)?,
            MappingFormat::Csv => read_csv_records(text.as_bytes())?,
        };
        self.from_records(records)
    }

    /// Resolve records in order. The first bad record aborts loading.
    pub fn from_records(&self, records: Vec<MappingRecord>) -> Result<Mapping> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                debug!(
                    index,
                    target = %record.target_field,
                    operation = %record.operation,
                    "resolving mapping record"
                );
                record.into_entry(index, &self.values)
            })
            .collect()
    }
}

/// Parse a JSON array of mapping records.
pub fn read_json_records(text: &str) -> Result<Vec<MappingRecord>> {
    Ok(serde_json::from_str(text)?)
}

/// Parse a CSV mapping table into records.
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<MappingRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('\u{feff}').trim().to_string())
        .collect();
    for header in &headers {
        if !is_known_column(header) {
            warn!(column = %header, "ignoring unknown mapping column");
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let index = records.len();
        let mut record = MappingRecord::default();
        for (header, raw) in headers.iter().zip(row.iter()) {
            // Argument values keep their whitespace (separators).
            if let Some(arg) = header.strip_prefix(ARGS_PREFIX) {
                if !raw.is_empty() {
                    record.args.insert(arg.to_string(), raw.to_string());
                }
                continue;
            }
            let cell = raw.trim();
            if cell.is_empty() {
                continue;
            }
            match header.as_str() {
                "target_field" => record.target_field = cell.to_string(),
                "operation" => record.operation = cell.to_string(),
                "source_field" => record.source_field = Some(cell.to_string()),
                "source_fields" => {
                    record.source_fields = Some(
                        cell.split(',')
                            .map(str::trim)
                            .filter(|p| !p.is_empty())
                            .map(String::from)
                            .collect(),
                    );
                }
                _ => {}
            }
        }
        if record.target_field.is_empty() {
            return Err(MappingLoadError::InvalidRecord {
                index,
                reason: "missing target_field".to_string(),
            });
        }
        records.push(record);
    }
    Ok(records)
}

fn is_known_column(header: &str) -> bool {
    matches!(
        header,
        "target_field" | "operation" | "source_field" | "source_fields"
    ) || header.starts_with(ARGS_PREFIX)
}
