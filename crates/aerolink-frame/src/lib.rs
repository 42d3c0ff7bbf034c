//! Wire-exact message codec.
//!
//! Converts between a schema-bound in-memory [`Message`] and its byte
//! frame:
//!
//! ```text
//! ┌───────┬─────┬──────────────┬────────────┬─────┬─────┬─────┬────────────┬─────────┬───────┬───────────┐
//! │ magic │ len │ incompat_fl. │ compat_fl. │ seq │ sys │ cmp │ msgid 1/3B │ payload │ crc16 │ signature │
//! └───────┴─────┴──────────────┴────────────┴─────┴─────┴─────┴────────────┴─────────┴───────┴───────────┘
//! ```
//!
//! Two protocol versions share the stream: the extended form (magic
//! `0xFD`, three-byte message id, flag bytes, optional signature) and the
//! legacy form (magic `0xFE`, single-byte id). The checksum covers the
//! header after the magic, the payload, and the definition's crc-extra
//! seed.
//!
//! [`StreamDecoder`] reassembles frames from an arbitrary byte stream: it
//! buffers partial frames, resynchronizes one byte at a time on garbage or
//! checksum failure, and reports frames with unknown message ids
//! distinctly from corrupt ones.

pub mod codec;
pub mod crc;
pub mod decoder;
pub mod error;
pub mod header;
pub mod message;
pub mod value;

pub use codec::{encode, MAGIC_V1, MAGIC_V2};
pub use crc::Crc;
pub use decoder::{DecoderEvent, DecoderStats, StreamDecoder};
pub use error::{Result, WireError};
pub use header::{Header, HeaderMut, Identifier, ProtocolVersion, INCOMPAT_FLAG_SIGNED};
pub use message::{FieldValue, Message, MessageSetExt};
pub use value::Value;
