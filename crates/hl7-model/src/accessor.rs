//! Reading and writing values at a [`FieldAddress`].
//!
//! Only the first segment with a matching code and the first field with a
//! matching index are addressable. Writes create whatever is missing by
//! appending it at the end of the message or segment.

use std::collections::BTreeMap;

use tracing::trace;

use crate::address::FieldAddress;
use crate::error::AccessError;
use crate::message::{HEADER_SEGMENT, Message};

impl Message {
    /// Value of a whole field or of one of its components.
    pub fn get(&self, address: &FieldAddress) -> Result<String, AccessError> {
        let field = self
            .segment(address.segment())
            .and_then(|segment| segment.field(address.field()))
            .ok_or_else(|| AccessError::FieldNotFound {
                address: address.to_string(),
            })?;

        if address.is_whole_field() {
            return Ok(field.value().to_string());
        }

        field
            .components(self.component_separator())
            .into_iter()
            .enumerate()
            .find(|(offset, _)| offset + 1 == address.component())
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| AccessError::ComponentNotFound {
                component: address.component_name(),
            })
    }

    /// Write `value` at `address`, creating the segment and field if needed.
    ///
    /// Writing a component rebuilds the whole field: existing components keep
    /// their positions, gaps up to the addressed position are filled with
    /// empty strings. Writing MSH.1 or MSH.2 also switches the message's
    /// field separator or encoding characters.
    pub fn set(&mut self, address: &FieldAddress, value: &str) {
        let separator = self.component_separator();

        if self.segment(address.segment()).is_none() {
            trace!(segment = address.segment(), "appending segment");
            self.append_segment(address.segment());
        }
        let Some(segment) = self.segment_mut(address.segment()) else {
            return;
        };
        if segment.field(address.field()).is_none() {
            trace!(field = %address.field_name(), "appending field");
            segment.append_field(address.field());
        }
        let Some(field) = segment.field_mut(address.field()) else {
            return;
        };

        if address.is_whole_field() {
            field.set_value(value);
        } else {
            let mut positions: BTreeMap<usize, String> = field
                .components(separator)
                .into_iter()
                .enumerate()
                .map(|(offset, component)| (offset + 1, component.to_string()))
                .collect();
            positions.insert(address.component(), value.to_string());

            let length = positions.keys().next_back().copied().unwrap_or(0);
            let separator = separator.to_string();
            let joined = (1..=length)
                .map(|position| positions.get(&position).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join(separator.as_str());
            field.set_value(joined);
        }

        if address.segment() == HEADER_SEGMENT && address.field() <= 2 {
            self.sync_header_separators();
        }
    }
}
