//! HL7 v2 message tree and its ER7 text form.
//!
//! A [`Message`] owns an ordered list of [`Segment`]s, each owning an ordered
//! list of [`Field`]s. Field values are kept as raw strings; components are
//! derived on demand by splitting on the component separator.
//!
//! Repetitions, sub-components and escape sequences are not interpreted:
//! they travel through as part of the raw value.

use std::path::Path;

use tracing::debug;

use crate::error::{MessageParseError, ModelError, Result};

/// Field separator used when no MSH header says otherwise.
pub const DEFAULT_FIELD_SEPARATOR: char = '|';

/// Encoding characters (component, repetition, escape, sub-component).
pub const DEFAULT_ENCODING_CHARACTERS: &str = "^~\\&";

/// Segment code of the message header.
pub const HEADER_SEGMENT: &str = "MSH";

/// A single field slot within a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    index: usize,
    value: String,
    structured: bool,
}

impl Field {
    pub fn new(index: usize, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
            structured: true,
        }
    }

    /// A field whose value is never split into components (MSH.1, MSH.2).
    fn opaque(index: usize, value: impl Into<String>) -> Self {
        Self {
            structured: false,
            ..Self::new(index, value)
        }
    }

    /// 1-based position within the segment.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Component values in order. An empty field has no components.
    pub fn components(&self, separator: char) -> Vec<&str> {
        if self.value.is_empty() {
            return Vec::new();
        }
        if !self.structured {
            return vec![self.value.as_str()];
        }
        self.value.split(separator).collect()
    }
}

/// A named group of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    code: String,
    fields: Vec<Field>,
}

impl Segment {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            fields: Vec::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Fields in insertion order (not necessarily sorted by index).
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First field with the given index.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.iter().find(|f| f.index == index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.index == index)
    }

    /// Append an empty field at the end of the segment.
    pub fn append_field(&mut self, index: usize) -> &mut Field {
        let field = if self.is_header() && index <= 2 {
            Field::opaque(index, "")
        } else {
            Field::new(index, "")
        };
        self.fields.push(field);
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    fn is_header(&self) -> bool {
        self.code == HEADER_SEGMENT
    }

    fn highest_index(&self) -> usize {
        self.fields.iter().map(|f| f.index).max().unwrap_or(0)
    }

    fn slot(&self, index: usize) -> &str {
        self.field(index).map(Field::value).unwrap_or("")
    }

    fn to_er7(&self, field_separator: char, encoding_characters: &str) -> String {
        let mut out = self.code.clone();
        if self.is_header() {
            out.push(field_separator);
            let encoding = self
                .field(2)
                .map(Field::value)
                .filter(|v| !v.is_empty())
                .unwrap_or(encoding_characters);
            out.push_str(encoding);
            for index in 3..=self.highest_index() {
                out.push(field_separator);
                out.push_str(self.slot(index));
            }
        } else {
            for index in 1..=self.highest_index() {
                out.push(field_separator);
                out.push_str(self.slot(index));
            }
        }
        out
    }
}

/// An HL7 v2 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    segments: Vec<Segment>,
    field_separator: char,
    encoding_characters: String,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// An empty message with the default separators.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            field_separator: DEFAULT_FIELD_SEPARATOR,
            encoding_characters: DEFAULT_ENCODING_CHARACTERS.to_string(),
        }
    }

    /// Parse ER7 text. Segments may be delimited by `\r`, `\n` or `\r\n`.
    pub fn parse(text: &str) -> std::result::Result<Self, MessageParseError> {
        let mut message = Self::new();
        let mut header_seen = false;
        let normalized = text.replace("\r\n", "\n");
        for (line_no, line) in normalized.split(['\r', '\n']).enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = line_no + 1;
            if line.starts_with(HEADER_SEGMENT) && !header_seen {
                message.read_header_separators(line, line_no)?;
                header_seen = true;
            }
            let segment = message.parse_segment(line, line_no)?;
            message.segments.push(segment);
        }
        debug!(segments = message.segments.len(), "parsed message");
        Ok(message)
    }

    /// Read, trim and parse a message file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(text.trim()).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn read_header_separators(
        &mut self,
        line: &str,
        line_no: usize,
    ) -> std::result::Result<(), MessageParseError> {
        let rest = &line[HEADER_SEGMENT.len()..];
        let mut chars = rest.chars();
        let separator = chars
            .next()
            .ok_or(MessageParseError::InvalidHeader { line: line_no })?;
        let encoding = chars.as_str().split(separator).next().unwrap_or("");
        if encoding.is_empty() {
            return Err(MessageParseError::InvalidHeader { line: line_no });
        }
        self.field_separator = separator;
        self.encoding_characters = encoding.to_string();
        Ok(())
    }

    fn parse_segment(
        &self,
        line: &str,
        line_no: usize,
    ) -> std::result::Result<Segment, MessageParseError> {
        let mut tokens = line.split(self.field_separator);
        let code = tokens.next().unwrap_or("");
        if code.is_empty() {
            return Err(MessageParseError::MissingSegmentCode {
                line: line_no,
                text: line.to_string(),
            });
        }
        let mut segment = Segment::new(code);
        if segment.is_header() {
            segment
                .fields
                .push(Field::opaque(1, self.field_separator.to_string()));
            let encoding = tokens.next().unwrap_or("");
            segment.fields.push(Field::opaque(2, encoding));
            for (offset, value) in tokens.enumerate() {
                if !value.is_empty() {
                    segment.fields.push(Field::new(offset + 3, value));
                }
            }
        } else {
            for (offset, value) in tokens.enumerate() {
                if !value.is_empty() {
                    segment.fields.push(Field::new(offset + 1, value));
                }
            }
        }
        Ok(segment)
    }

    /// Re-read the separators from MSH.1 and MSH.2 after they were written.
    /// Empty values leave the current separators in place.
    pub(crate) fn sync_header_separators(&mut self) {
        let Some(header) = self.segment(HEADER_SEGMENT) else {
            return;
        };
        let separator = header.field(1).and_then(|f| f.value().chars().next());
        let encoding = header
            .field(2)
            .map(Field::value)
            .filter(|v| !v.is_empty())
            .map(String::from);
        if let Some(separator) = separator {
            self.field_separator = separator;
        }
        if let Some(encoding) = encoding {
            self.encoding_characters = encoding;
        }
    }

    /// Serialize to ER7 with segments joined by `\n`.
    pub fn to_er7(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_er7(self.field_separator, &self.encoding_characters))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn field_separator(&self) -> char {
        self.field_separator
    }

    pub fn encoding_characters(&self) -> &str {
        &self.encoding_characters
    }

    /// Separator between the components of a field.
    pub fn component_separator(&self) -> char {
        self.encoding_characters.chars().next().unwrap_or('^')
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// First segment with the given code.
    pub fn segment(&self, code: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.code == code)
    }

    pub fn segment_mut(&mut self, code: &str) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.code == code)
    }

    /// Append an empty segment at the end of the message.
    pub fn append_segment(&mut self, code: impl Into<String>) -> &mut Segment {
        self.segments.push(Segment::new(code));
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_er7())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "MSH|^~\\&|GHH_ADT||||20080115153000||SIU^S12|0123456789|P|2.5\r\
                          PID|||123456||DOE^JOHN";

    #[test]
    fn parses_header_separators() {
        let message = Message::parse(SAMPLE).unwrap();
        assert_eq!(message.field_separator(), '|');
        assert_eq!(message.component_separator(), '^');
        assert_eq!(message.segment_count(), 2);
    }

    #[test]
    fn header_fields_are_offset_by_separator() {
        let message = Message::parse(SAMPLE).unwrap();
        let msh = message.segment("MSH").unwrap();
        assert_eq!(msh.field(1).unwrap().value(), "|");
        assert_eq!(msh.field(2).unwrap().value(), "^~\\&");
        assert_eq!(msh.field(3).unwrap().value(), "GHH_ADT");
        assert_eq!(msh.field(9).unwrap().value(), "SIU^S12");
        assert!(msh.field(4).is_none());
    }

    #[test]
    fn encoding_characters_are_not_split() {
        let message = Message::parse(SAMPLE).unwrap();
        let msh2 = message.segment("MSH").unwrap().field(2).unwrap();
        assert_eq!(msh2.components('^'), vec!["^~\\&"]);
    }

    #[test]
    fn serializes_back_to_er7() {
        let message = Message::parse(SAMPLE).unwrap();
        assert_eq!(
            message.to_er7(),
            "MSH|^~\\&|GHH_ADT||||20080115153000||SIU^S12|0123456789|P|2.5\n\
             PID|||123456||DOE^JOHN"
        );
    }

    #[test]
    fn rejects_segment_without_code() {
        let err = Message::parse("MSH|^~\\&|A\n|B").unwrap_err();
        assert!(matches!(
            err,
            MessageParseError::MissingSegmentCode { line: 2, .. }
        ));
    }

    #[test]
    fn custom_field_separator() {
        let message = Message::parse("MSH#^~\\&#APP\nPID###42").unwrap();
        assert_eq!(message.field_separator(), '#');
        assert_eq!(
            message.segment("PID").unwrap().field(3).unwrap().value(),
            "42"
        );
        assert_eq!(message.to_er7(), "MSH#^~\\&#APP\nPID###42");
    }
}
