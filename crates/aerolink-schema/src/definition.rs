use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::field::{FieldDef, WireType};

/// Largest frame header (extended three-byte message id form).
pub const MAX_HEADER_LEN: usize = 10;
/// Width of the trailing checksum.
pub const CHECKSUM_LEN: usize = 2;
/// Width of the optional trailing signature.
pub const SIGNATURE_LEN: usize = 13;
/// The one-byte length field caps payloads at this size.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Immutable description of one message type: id, name, crc-extra seed,
/// and the fixed payload layout of its fields.
///
/// Built through [`MessageDefinitionBuilder`]; never mutated afterwards.
/// Fields are stored in payload-offset order.
#[derive(Debug)]
pub struct MessageDefinition {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<FieldDef>,
    index: HashMap<String, usize>,
    max_payload_size: usize,
}

impl MessageDefinition {
    /// Message id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-message checksum seed, mixed into every frame's CRC.
    pub fn crc_extra(&self) -> u8 {
        self.crc_extra
    }

    /// Payload size with every field present, in bytes.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Upper bound for a whole frame: header, payload, checksum and
    /// signature.
    pub fn max_buffer_len(&self) -> usize {
        MAX_HEADER_LEN + self.max_payload_size + CHECKSUM_LEN + SIGNATURE_LEN
    }

    /// Fields in payload-offset order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Whether the payload contains a field with this name.
    pub fn contains_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Field names in payload-offset order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Builder for a [`MessageDefinition`].
///
/// Fields are declared in dialect order; `build` lays them out the
/// canonical way: non-extension fields stable-sorted by descending element
/// width, extension fields appended in declaration order.
#[derive(Debug)]
pub struct MessageDefinitionBuilder {
    id: u32,
    name: String,
    crc_extra: u8,
    fields: Vec<PendingField>,
}

#[derive(Debug)]
struct PendingField {
    name: String,
    wire_type: WireType,
    array_len: usize,
    extension: bool,
}

impl MessageDefinitionBuilder {
    /// Start a definition for the given id and name.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            crc_extra: 0,
            fields: Vec::new(),
        }
    }

    /// Set the crc-extra seed.
    pub fn crc_extra(mut self, crc_extra: u8) -> Self {
        self.crc_extra = crc_extra;
        self
    }

    /// Declare a scalar field.
    pub fn field(self, name: impl Into<String>, wire_type: WireType) -> Self {
        self.push(name.into(), wire_type, 1, false)
    }

    /// Declare an array field.
    pub fn array(self, name: impl Into<String>, wire_type: WireType, len: usize) -> Self {
        self.push(name.into(), wire_type, len, false)
    }

    /// Declare a scalar extension field.
    pub fn extension(self, name: impl Into<String>, wire_type: WireType) -> Self {
        self.push(name.into(), wire_type, 1, true)
    }

    /// Declare an array extension field.
    pub fn extension_array(
        self,
        name: impl Into<String>,
        wire_type: WireType,
        len: usize,
    ) -> Self {
        self.push(name.into(), wire_type, len, true)
    }

    fn push(mut self, name: String, wire_type: WireType, array_len: usize, extension: bool) -> Self {
        self.fields.push(PendingField {
            name,
            wire_type,
            array_len: array_len.max(1),
            extension,
        });
        self
    }

    /// Compute the payload layout and freeze the definition.
    pub fn build(self) -> Result<MessageDefinition> {
        let mut ordered: Vec<&PendingField> =
            self.fields.iter().filter(|f| !f.extension).collect();
        // Stable sort keeps declaration order within one width class.
        ordered.sort_by(|a, b| b.wire_type.width().cmp(&a.wire_type.width()));
        ordered.extend(self.fields.iter().filter(|f| f.extension));

        let mut fields = Vec::with_capacity(ordered.len());
        let mut index = HashMap::with_capacity(ordered.len());
        let mut offset = 0usize;
        for pending in ordered {
            if index
                .insert(pending.name.clone(), fields.len())
                .is_some()
            {
                return Err(SchemaError::DuplicateField {
                    message: self.name,
                    field: pending.name.clone(),
                });
            }
            fields.push(FieldDef {
                name: pending.name.clone(),
                wire_type: pending.wire_type,
                array_len: pending.array_len,
                offset,
                extension: pending.extension,
            });
            offset += pending.wire_type.width() * pending.array_len;
        }

        if offset > MAX_PAYLOAD_LEN {
            return Err(SchemaError::PayloadTooLarge {
                message: self.name,
                size: offset,
                max: MAX_PAYLOAD_LEN,
            });
        }

        Ok(MessageDefinition {
            id: self.id,
            name: self.name,
            crc_extra: self.crc_extra,
            fields,
            index,
            max_payload_size: offset,
        })
    }
}
