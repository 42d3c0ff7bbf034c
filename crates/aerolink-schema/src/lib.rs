//! Message definitions and the schema registry.
//!
//! A [`MessageDefinition`] describes one message type: its id, name,
//! per-message crc-extra seed, and the fixed payload layout of its fields.
//! A [`MessageSet`] maps ids and names to shared definitions. Both are
//! immutable once built; construction happens exclusively through
//! [`MessageSetBuilder`], which is the seam an external definition loader
//! (e.g. an XML dialect parser) drives.
//!
//! Because the set is frozen after construction, it can be shared across
//! connections and runtimes behind an `Arc` with no locking.

pub mod definition;
pub mod error;
pub mod field;
pub mod registry;

pub use definition::{MessageDefinition, MessageDefinitionBuilder};
pub use error::{Result, SchemaError};
pub use field::{FieldDef, WireType};
pub use registry::{MessageSet, MessageSetBuilder};
