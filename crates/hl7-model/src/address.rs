#![deny(unsafe_code)]

//! Dotted field paths such as `PID.3` or `SCH.11.4`.

use std::fmt;
use std::str::FromStr;

use crate::AddressParseError;

/// Position of a value inside a message: `SEGMENT.FIELD[.COMPONENT]`.
///
/// A component of `0` addresses the whole field value. An omitted field
/// defaults to `1` and an omitted component to `0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldAddress {
    segment: String,
    field: usize,
    component: usize,
}

impl FieldAddress {
    pub fn parse(path: &str) -> Result<Self, AddressParseError> {
        let mut parts = path.split('.');
        let segment = parts.next().unwrap_or("").trim();
        if segment.is_empty() {
            return Err(AddressParseError::EmptySegment {
                path: path.to_string(),
            });
        }
        let field = match parts.next() {
            Some(token) => parse_index(path, "field", token)?,
            None => 1,
        };
        if field == 0 {
            return Err(AddressParseError::ZeroField {
                path: path.to_string(),
            });
        }
        let component = match parts.next() {
            Some(token) => parse_index(path, "component", token)?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(AddressParseError::TooManyParts {
                path: path.to_string(),
            });
        }
        Ok(Self {
            segment: segment.to_string(),
            field,
            component,
        })
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn component(&self) -> usize {
        self.component
    }

    /// True when the address selects the whole field rather than one component.
    pub fn is_whole_field(&self) -> bool {
        self.component == 0
    }

    /// The same field without a component selector.
    #[must_use]
    pub fn whole_field(&self) -> Self {
        Self {
            component: 0,
            ..self.clone()
        }
    }

    /// Field-scope name, e.g. `PID_3`.
    pub fn field_name(&self) -> String {
        format!("{}_{}", self.segment, self.field)
    }

    /// Component-scope name, e.g. `PID_3_1`.
    pub fn component_name(&self) -> String {
        format!("{}_{}_{}", self.segment, self.field, self.component)
    }
}

fn parse_index(path: &str, part: &'static str, token: &str) -> Result<usize, AddressParseError> {
    let trimmed = token.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| AddressParseError::InvalidNumber {
            path: path.to_string(),
            part,
            token: token.to_string(),
        })
}

impl FromStr for FieldAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.component == 0 {
            write!(f, "{}.{}", self.segment, self.field)
        } else {
            write!(f, "{}.{}.{}", self.segment, self.field, self.component)
        }
    }
}

impl serde::Serialize for FieldAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for FieldAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
