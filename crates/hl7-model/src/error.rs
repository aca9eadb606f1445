//! Error types for the HL7 message model.

use std::path::PathBuf;

use thiserror::Error;

/// A dotted field path could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Nothing before the first dot.
    #[error("field path '{path}' has an empty segment code")]
    EmptySegment { path: String },

    /// Field or component token is not a non-negative integer.
    #[error("field path '{path}': {part} '{token}' is not a non-negative integer")]
    InvalidNumber {
        path: String,
        part: &'static str,
        token: String,
    },

    /// Field indices are 1-based.
    #[error("field path '{path}': field index must be at least 1")]
    ZeroField { path: String },

    /// More than `SEGMENT.FIELD.COMPONENT`.
    #[error("field path '{path}' has too many parts (expected SEGMENT.FIELD[.COMPONENT])")]
    TooManyParts { path: String },
}

/// Lookup failures raised by [`crate::Message::get`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The segment or the field is not present in the message.
    #[error("could not retrieve {address}: field not found")]
    FieldNotFound { address: String },

    /// The field exists but has fewer components than addressed.
    #[error("component {component} does not exist")]
    ComponentNotFound { component: String },
}

/// ER7 text could not be turned into a message tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    /// Segment line that starts with a field separator.
    #[error("line {line}: segment '{text}' has no segment code")]
    MissingSegmentCode { line: usize, text: String },

    /// MSH header without a field separator or encoding characters.
    #[error("line {line}: MSH header is missing its encoding characters")]
    InvalidHeader { line: usize },
}

/// Errors surfaced by file-level model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read message {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse message {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: MessageParseError,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_error_display() {
        let err = AccessError::FieldNotFound {
            address: "NTE.4".to_string(),
        };
        assert_eq!(err.to_string(), "could not retrieve NTE.4: field not found");
    }

    #[test]
    fn test_parse_error_display() {
        let err = AddressParseError::InvalidNumber {
            path: "PID.x".to_string(),
            part: "field",
            token: "x".to_string(),
        };
        assert!(err.to_string().contains("'x'"));
    }
}
