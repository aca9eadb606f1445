//! Applying a mapping to a message.
//!
//! Entries run strictly in mapping order: an entry may read a field that an
//! earlier entry wrote. The first failing entry stops the run and nothing is
//! rolled back.

use std::time::Instant;

use hl7_model::{FieldAddress, Message};
use tracing::{debug, info, info_span, trace, warn};

use crate::error::TransformExecutionError;
use crate::operations::Operation;

/// One write: the target field and the operation computing its value.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub target: FieldAddress,
    pub operation: Operation,
}

impl MappingEntry {
    pub fn new(target: FieldAddress, operation: Operation) -> Self {
        Self { target, operation }
    }
}

/// Ordered list of mapping entries. Duplicate targets are allowed; the later
/// entry wins.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: MappingEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<MappingEntry> for Mapping {
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Progress of a single transform run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformState {
    Pending,
    Applying(usize),
    Done,
    Failed(usize),
}

/// Applies a [`Mapping`] to one message at a time.
#[derive(Debug, Clone)]
pub struct TransformExecutor {
    mapping: Mapping,
}

impl TransformExecutor {
    pub fn new(mapping: Mapping) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Apply every entry in order, mutating `message` in place.
    ///
    /// # Errors
    ///
    /// Returns the first entry failure with its target and position. Entries
    /// applied before the failure remain in the message.
    pub fn execute(&self, message: &mut Message) -> Result<(), TransformExecutionError> {
        let span = info_span!("transform", entries = self.mapping.len());
        let _guard = span.enter();
        let start = Instant::now();

        let mut state = TransformState::Pending;
        trace!(?state, "transform starting");
        for (index, entry) in self.mapping.entries().iter().enumerate() {
            state = TransformState::Applying(index);
            trace!(?state, target = %entry.target, "applying entry");
            match entry.operation.execute(message) {
                Ok(value) => {
                    debug!(
                        index,
                        target = %entry.target,
                        operation = entry.operation.name(),
                        "entry applied"
                    );
                    message.set(&entry.target, &value);
                }
                Err(cause) => {
                    state = TransformState::Failed(index);
                    warn!(
                        index,
                        target = %entry.target,
                        operation = entry.operation.name(),
                        error = %cause,
                        ?state,
                        "entry failed"
                    );
                    return Err(TransformExecutionError {
                        target: entry.target.clone(),
                        index,
                        cause,
                    });
                }
            }
        }
        state = TransformState::Done;

        info!(
            entries = self.mapping.len(),
            segments = message.segment_count(),
            duration_ms = start.elapsed().as_millis(),
            ?state,
            "transform complete"
        );
        Ok(())
    }

    /// Owned variant of [`execute`](Self::execute) returning the message.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute); the partially transformed message
    /// is dropped.
    pub fn apply(&self, mut message: Message) -> Result<Message, TransformExecutionError> {
        self.execute(&mut message)?;
        Ok(message)
    }
}
