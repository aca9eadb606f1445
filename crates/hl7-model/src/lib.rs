//! HL7 v2 message model.
//!
//! - **address**: dotted field paths (`PID.3`, `SCH.11.4`)
//! - **message**: segment/field tree with ER7 parse and serialize
//! - **accessor**: `get`/`set` of values at a field address
//! - **error**: model error types

pub mod accessor;
pub mod address;
pub mod error;
pub mod message;

pub use address::FieldAddress;
pub use error::{AccessError, AddressParseError, MessageParseError, ModelError, Result};
pub use message::{Field, Message, Segment};
