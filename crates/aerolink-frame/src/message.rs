use std::fmt;
use std::sync::Arc;

use aerolink_schema::{FieldDef, MessageDefinition, MessageSet, WireType};
use bytes::BytesMut;

use crate::error::{Result, WireError};
use crate::header::{Header, HeaderMut, ProtocolVersion};
use crate::value::Value;

/// A schema-bound, mutable message.
///
/// Owns one frame-sized byte buffer (header region + payload region) and a
/// shared reference to its [`MessageDefinition`]. Field accessors compute
/// offsets from the definition and read or write the payload bytes in
/// place; the header accessors overlay the leading bytes the same way.
#[derive(Clone)]
pub struct Message {
    definition: Arc<MessageDefinition>,
    buf: BytesMut,
}

/// Raw content of one payload element, before accessor conversion.
#[derive(Clone, Copy)]
enum Raw {
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
}

impl Raw {
    fn as_int(self) -> i64 {
        match self {
            Raw::Int(v) => v,
            Raw::UInt(v) => v as i64,
            Raw::F32(v) => v as i64,
            Raw::F64(v) => v as i64,
        }
    }

    fn to_i64_bits(self) -> i64 {
        match self {
            Raw::Int(v) => v,
            Raw::UInt(v) => v as i64,
            Raw::F32(v) => i64::from(v.to_bits()),
            Raw::F64(v) => v.to_bits() as i64,
        }
    }

    fn to_u64_bits(self) -> u64 {
        match self {
            Raw::Int(v) => v as u64,
            Raw::UInt(v) => v,
            Raw::F32(v) => u64::from(v.to_bits()),
            Raw::F64(v) => v.to_bits(),
        }
    }

    fn to_f32(self) -> f32 {
        match self {
            Raw::Int(v) => v as f32,
            Raw::UInt(v) => v as f32,
            Raw::F32(v) => v,
            Raw::F64(v) => v as f32,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Raw::Int(v) => v as f64,
            Raw::UInt(v) => v as f64,
            Raw::F32(v) => f64::from(v),
            Raw::F64(v) => v,
        }
    }
}

mod convert {
    use super::Raw;

    /// Conversion between accessor types and raw element content. Sealed:
    /// the supported accessor types are fixed by the wire format.
    pub trait Convert: Copy {
        fn from_raw(raw: Raw) -> Self;
        fn to_raw(self) -> Raw;
    }

    impl Convert for i64 {
        fn from_raw(raw: Raw) -> Self {
            raw.to_i64_bits()
        }
        fn to_raw(self) -> Raw {
            Raw::Int(self)
        }
    }

    impl Convert for u64 {
        fn from_raw(raw: Raw) -> Self {
            raw.to_u64_bits()
        }
        fn to_raw(self) -> Raw {
            Raw::UInt(self)
        }
    }

    impl Convert for f32 {
        fn from_raw(raw: Raw) -> Self {
            raw.to_f32()
        }
        fn to_raw(self) -> Raw {
            Raw::F32(self)
        }
    }

    impl Convert for f64 {
        fn from_raw(raw: Raw) -> Self {
            raw.to_f64()
        }
        fn to_raw(self) -> Raw {
            Raw::F64(self)
        }
    }

    macro_rules! convert_via {
        ($($ty:ty => $wide:ty),* $(,)?) => {
            $(
                impl Convert for $ty {
                    fn from_raw(raw: Raw) -> Self {
                        <$wide>::from_raw(raw) as $ty
                    }
                    fn to_raw(self) -> Raw {
                        (self as $wide).to_raw()
                    }
                }
            )*
        };
    }

    convert_via! {
        i8 => i64,
        i16 => i64,
        i32 => i64,
        u8 => u64,
        u16 => u64,
        u32 => u64,
    }
}

/// Types usable with the typed [`Message::get`]/[`Message::set`]
/// accessors.
pub trait FieldValue: convert::Convert {}

impl FieldValue for i8 {}
impl FieldValue for i16 {}
impl FieldValue for i32 {}
impl FieldValue for i64 {}
impl FieldValue for u8 {}
impl FieldValue for u16 {}
impl FieldValue for u32 {}
impl FieldValue for u64 {}
impl FieldValue for f32 {}
impl FieldValue for f64 {}

impl Message {
    /// Create a zero-valued message bound to a definition.
    pub fn new(definition: Arc<MessageDefinition>) -> Self {
        let mut buf = BytesMut::zeroed(definition.max_buffer_len());
        buf[0] = ProtocolVersion::V2.magic();
        let mut message = Self { definition, buf };
        let id = message.definition.id();
        let len = message.definition.max_payload_size() as u8;
        message.header_mut().set_message_id(id).set_len(len);
        message
    }

    /// Rebuild a message from decoded wire bytes. A payload shorter than
    /// the definition's declared size (trailing-zero trimming) is
    /// zero-extended.
    pub(crate) fn from_wire(
        definition: Arc<MessageDefinition>,
        header_bytes: &[u8],
        payload: &[u8],
    ) -> Self {
        let mut buf = BytesMut::zeroed(definition.max_buffer_len());
        buf[..header_bytes.len()].copy_from_slice(header_bytes);
        let payload_offset = header_bytes.len();
        buf[payload_offset..payload_offset + payload.len()].copy_from_slice(payload);
        Self { definition, buf }
    }

    /// Message id.
    pub fn id(&self) -> u32 {
        self.definition.id()
    }

    /// Message name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The definition this message is bound to.
    pub fn definition(&self) -> &Arc<MessageDefinition> {
        &self.definition
    }

    /// Read-only header overlay.
    pub fn header(&self) -> Header<'_> {
        Header::new(&self.buf)
    }

    /// Mutable header overlay. Writes go straight to the frame bytes.
    pub fn header_mut(&mut self) -> HeaderMut<'_> {
        HeaderMut::new(&mut self.buf)
    }

    /// Protocol version this message will encode as.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.header().version()
    }

    /// Switch the protocol version, relocating the payload to the new
    /// header geometry.
    pub fn set_protocol_version(&mut self, version: ProtocolVersion) {
        let current = self.protocol_version();
        if current == version {
            return;
        }

        let header = self.header();
        let seq = header.seq();
        let sender = header.sender();
        let len = header.len();
        let old_offset = current.header_len();
        let new_offset = version.header_len();
        let payload_size = self.definition.max_payload_size();

        self.buf
            .copy_within(old_offset..old_offset + payload_size, new_offset);
        for byte in &mut self.buf[new_offset + payload_size..] {
            *byte = 0;
        }
        for byte in &mut self.buf[..new_offset] {
            *byte = 0;
        }
        self.buf[0] = version.magic();
        let id = self.definition.id();
        self.header_mut()
            .set_len(len)
            .set_seq(seq)
            .set_sender(sender)
            .set_message_id(id);
    }

    /// The full (untrimmed) payload region.
    pub fn payload(&self) -> &[u8] {
        let offset = self.payload_offset();
        &self.buf[offset..offset + self.definition.max_payload_size()]
    }

    fn payload_offset(&self) -> usize {
        self.protocol_version().header_len()
    }

    fn resolve(&self, name: &str) -> Result<FieldDef> {
        self.definition
            .field(name)
            .cloned()
            .ok_or_else(|| WireError::UnknownField {
                message: self.definition.name().to_string(),
                field: name.to_string(),
            })
    }

    fn element_offset(&self, field: &FieldDef, index: usize) -> Result<usize> {
        if index >= field.array_len() {
            return Err(WireError::IndexOutOfRange {
                field: field.name().to_string(),
                index,
                len: field.array_len(),
            });
        }
        Ok(self.payload_offset() + field.offset() + index * field.wire_type().width())
    }

    fn read_element(&self, field: &FieldDef, index: usize) -> Result<Raw> {
        let off = self.element_offset(field, index)?;
        let b = &self.buf[off..];
        let raw = match field.wire_type() {
            WireType::U8 | WireType::Char => Raw::UInt(u64::from(b[0])),
            WireType::U16 => Raw::UInt(u64::from(u16::from_le_bytes([b[0], b[1]]))),
            WireType::U32 => {
                Raw::UInt(u64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            WireType::U64 => Raw::UInt(u64::from_le_bytes([
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            ])),
            WireType::I8 => Raw::Int(i64::from(b[0] as i8)),
            WireType::I16 => Raw::Int(i64::from(i16::from_le_bytes([b[0], b[1]]))),
            WireType::I32 => {
                Raw::Int(i64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])))
            }
            WireType::I64 => Raw::Int(i64::from_le_bytes([
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            ])),
            WireType::F32 => Raw::F32(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            WireType::F64 => Raw::F64(f64::from_le_bytes([
                b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
            ])),
        };
        Ok(raw)
    }

    fn write_element(&mut self, field: &FieldDef, index: usize, raw: Raw) -> Result<()> {
        let off = self.element_offset(field, index)?;
        match field.wire_type() {
            WireType::U8 | WireType::Char => self.buf[off] = raw.as_int() as u8,
            WireType::I8 => self.buf[off] = raw.as_int() as i8 as u8,
            WireType::U16 | WireType::I16 => {
                let bytes = (raw.as_int() as u16).to_le_bytes();
                self.buf[off..off + 2].copy_from_slice(&bytes);
            }
            WireType::U32 | WireType::I32 => {
                let bytes = (raw.as_int() as u32).to_le_bytes();
                self.buf[off..off + 4].copy_from_slice(&bytes);
            }
            WireType::U64 | WireType::I64 => {
                let bytes = (raw.as_int() as u64).to_le_bytes();
                self.buf[off..off + 8].copy_from_slice(&bytes);
            }
            WireType::F32 => {
                let value = match raw {
                    // Integer writes carry the raw bit pattern.
                    Raw::Int(v) => f32::from_bits(v as u32),
                    Raw::UInt(v) => f32::from_bits(v as u32),
                    Raw::F32(v) => v,
                    Raw::F64(v) => v as f32,
                };
                self.buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
            }
            WireType::F64 => {
                let value = match raw {
                    Raw::Int(v) => f64::from_bits(v as u64),
                    Raw::UInt(v) => f64::from_bits(v),
                    Raw::F64(v) => v,
                    Raw::F32(v) => f64::from(v),
                };
                self.buf[off..off + 8].copy_from_slice(&value.to_le_bytes());
            }
        }
        Ok(())
    }

    /// Read a scalar field (or element 0 of an array field).
    pub fn get<T: FieldValue>(&self, field: &str) -> Result<T> {
        self.get_at(field, 0)
    }

    /// Read one element of a field.
    pub fn get_at<T: FieldValue>(&self, field: &str, index: usize) -> Result<T> {
        let field = self.resolve(field)?;
        Ok(T::from_raw(self.read_element(&field, index)?))
    }

    /// Write a scalar field (or element 0 of an array field).
    pub fn set<T: FieldValue>(&mut self, field: &str, value: T) -> Result<()> {
        self.set_at(field, 0, value)
    }

    /// Write one element of a field.
    pub fn set_at<T: FieldValue>(&mut self, field: &str, index: usize, value: T) -> Result<()> {
        let field = self.resolve(field)?;
        self.write_element(&field, index, value.to_raw())
    }

    /// Read a character-array field as a NUL-trimmed string.
    pub fn get_str(&self, field: &str) -> Result<String> {
        let field = self.resolve(field)?;
        if field.wire_type() != WireType::Char {
            return Err(WireError::ValueKindMismatch {
                field: field.name().to_string(),
                expected: "char array",
            });
        }
        let start = self.payload_offset() + field.offset();
        let bytes = &self.buf[start..start + field.array_len()];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Write a character-array field, NUL-padding to capacity.
    pub fn set_str(&mut self, field: &str, value: &str) -> Result<()> {
        let field = self.resolve(field)?;
        if field.wire_type() != WireType::Char {
            return Err(WireError::ValueKindMismatch {
                field: field.name().to_string(),
                expected: "char array",
            });
        }
        let bytes = value.as_bytes();
        if bytes.len() > field.array_len() {
            return Err(WireError::StringTooLong {
                field: field.name().to_string(),
                len: bytes.len(),
                max: field.array_len(),
            });
        }
        let start = self.payload_offset() + field.offset();
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        for byte in &mut self.buf[start + bytes.len()..start + field.array_len()] {
            *byte = 0;
        }
        Ok(())
    }

    /// Read any field as a discriminated [`Value`].
    pub fn field(&self, name: &str) -> Result<Value> {
        let field = self.resolve(name)?;
        if field.wire_type() == WireType::Char {
            return Ok(Value::Str(self.get_str(name)?));
        }
        if field.array_len() > 1 {
            let mut raws = Vec::with_capacity(field.array_len());
            for index in 0..field.array_len() {
                raws.push(self.read_element(&field, index)?);
            }
            let value = match field.wire_type() {
                WireType::F32 => Value::FloatArray(raws.iter().map(|r| r.to_f32()).collect()),
                WireType::F64 => Value::DoubleArray(raws.iter().map(|r| r.to_f64()).collect()),
                ty if ty.is_signed() => {
                    Value::IntArray(raws.iter().map(|r| r.as_int()).collect())
                }
                _ => Value::UIntArray(raws.iter().map(|r| r.to_u64_bits()).collect()),
            };
            return Ok(value);
        }
        let raw = self.read_element(&field, 0)?;
        let value = match field.wire_type() {
            WireType::F32 => Value::Float(raw.to_f32()),
            WireType::F64 => Value::Double(raw.to_f64()),
            ty if ty.is_signed() => Value::Int(raw.as_int()),
            _ => Value::UInt(raw.to_u64_bits()),
        };
        Ok(value)
    }

    /// Write any field from a discriminated [`Value`].
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let field = self.resolve(name)?;

        match value {
            Value::Str(ref s) => self.set_str(name, s),
            Value::Int(v) => self.write_scalar(&field, Raw::Int(v)),
            Value::UInt(v) => self.write_scalar(&field, Raw::UInt(v)),
            Value::Float(v) => self.write_scalar(&field, Raw::F32(v)),
            Value::Double(v) => self.write_scalar(&field, Raw::F64(v)),
            Value::IntArray(ref vs) => {
                self.write_array(&field, vs.iter().map(|&v| Raw::Int(v)), vs.len())
            }
            Value::UIntArray(ref vs) => {
                self.write_array(&field, vs.iter().map(|&v| Raw::UInt(v)), vs.len())
            }
            Value::FloatArray(ref vs) => {
                self.write_array(&field, vs.iter().map(|&v| Raw::F32(v)), vs.len())
            }
            Value::DoubleArray(ref vs) => {
                self.write_array(&field, vs.iter().map(|&v| Raw::F64(v)), vs.len())
            }
        }
    }

    fn write_scalar(&mut self, field: &FieldDef, raw: Raw) -> Result<()> {
        if field.array_len() > 1 {
            return Err(WireError::ValueKindMismatch {
                field: field.name().to_string(),
                expected: "array",
            });
        }
        self.write_element(field, 0, raw)
    }

    fn write_array(
        &mut self,
        field: &FieldDef,
        raws: impl Iterator<Item = Raw>,
        len: usize,
    ) -> Result<()> {
        if field.array_len() == 1 {
            return Err(WireError::ValueKindMismatch {
                field: field.name().to_string(),
                expected: "scalar",
            });
        }
        if len > field.array_len() {
            return Err(WireError::IndexOutOfRange {
                field: field.name().to_string(),
                index: len - 1,
                len: field.array_len(),
            });
        }
        for (index, raw) in raws.enumerate() {
            self.write_element(field, index, raw)?;
        }
        // Elements past the provided values are zeroed.
        for index in len..field.array_len() {
            self.write_element(field, index, Raw::UInt(0))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("header", &self.header())
            .finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (#{})", self.name(), self.id())?;
        for field in self.definition.fields() {
            match self.field(field.name()) {
                Ok(value) => writeln!(f, "  {}: {:?}", field.name(), value)?,
                Err(_) => writeln!(f, "  {}: <unreadable>", field.name())?,
            }
        }
        Ok(())
    }
}

/// Message-creation extension for [`MessageSet`].
///
/// Lives here rather than in the schema crate because creation binds a
/// definition to a frame buffer.
pub trait MessageSetExt {
    /// Create a zero-valued message for a message id.
    fn create(&self, id: u32) -> Result<Message>;

    /// Create a zero-valued message for a message name.
    fn create_by_name(&self, name: &str) -> Result<Message>;
}

impl MessageSetExt for MessageSet {
    fn create(&self, id: u32) -> Result<Message> {
        Ok(Message::new(self.definition(id)?))
    }

    fn create_by_name(&self, name: &str) -> Result<Message> {
        Ok(Message::new(self.definition_by_name(name)?))
    }
}

#[cfg(test)]
mod tests {
    use aerolink_schema::MessageDefinitionBuilder;

    use super::*;

    fn heartbeat_set() -> MessageSet {
        let mut builder = MessageSet::builder();
        builder
            .add(
                MessageDefinitionBuilder::new(0, "HEARTBEAT")
                    .crc_extra(50)
                    .field("type", WireType::U8)
                    .field("autopilot", WireType::U8)
                    .field("base_mode", WireType::U8)
                    .field("custom_mode", WireType::U32)
                    .field("system_status", WireType::U8)
                    .field("mavlink_version", WireType::U8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder
            .add(
                MessageDefinitionBuilder::new(22, "PARAM_VALUE")
                    .crc_extra(220)
                    .field("param_value", WireType::F32)
                    .field("param_count", WireType::U16)
                    .field("param_index", WireType::U16)
                    .array("param_id", WireType::Char, 16)
                    .field("param_type", WireType::U8)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder
            .add(
                MessageDefinitionBuilder::new(31, "SENSOR_SAMPLE")
                    .crc_extra(12)
                    .field("time_usec", WireType::U64)
                    .array("readings", WireType::F32, 4)
                    .field("delta", WireType::I16)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn create_is_zero_valued_and_bound() {
        let set = heartbeat_set();
        let msg = set.create_by_name("HEARTBEAT").unwrap();
        assert_eq!(msg.id(), 0);
        assert_eq!(msg.name(), "HEARTBEAT");
        assert_eq!(msg.get::<u32>("custom_mode").unwrap(), 0);
        assert!(msg.payload().iter().all(|&b| b == 0));
        assert_eq!(msg.header().message_id(), 0);
    }

    #[test]
    fn create_unknown_fails() {
        let set = heartbeat_set();
        assert!(set.create(999).is_err());
        assert!(set.create_by_name("NOPE").is_err());
    }

    #[test]
    fn scalar_round_trip_with_widening() {
        let set = heartbeat_set();
        let mut msg = set.create(0).unwrap();

        msg.set("type", 6u8).unwrap();
        msg.set("custom_mode", 0xDEAD_BEEFu32).unwrap();

        assert_eq!(msg.get::<u8>("type").unwrap(), 6);
        assert_eq!(msg.get::<i64>("type").unwrap(), 6);
        assert_eq!(msg.get::<u32>("custom_mode").unwrap(), 0xDEAD_BEEF);
        // Narrowing truncates.
        assert_eq!(msg.get::<u16>("custom_mode").unwrap(), 0xBEEF);
    }

    #[test]
    fn signed_fields_sign_extend() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();
        msg.set("delta", -5i16).unwrap();
        assert_eq!(msg.get::<i64>("delta").unwrap(), -5);
        assert_eq!(msg.get::<i16>("delta").unwrap(), -5);
    }

    #[test]
    fn float_fields_via_integer_accessor_use_bit_patterns() {
        let set = heartbeat_set();
        let mut msg = set.create(22).unwrap();

        msg.set("param_value", 1.5f32).unwrap();
        assert_eq!(
            msg.get::<u64>("param_value").unwrap(),
            u64::from(1.5f32.to_bits())
        );

        // Writing an integer stores it as raw bits, not a numeric cast.
        msg.set("param_value", u64::from(2.25f32.to_bits())).unwrap();
        assert_eq!(msg.get::<f32>("param_value").unwrap(), 2.25);
    }

    #[test]
    fn array_elements_are_independent() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();

        msg.set_at("readings", 0, 1.0f32).unwrap();
        msg.set_at("readings", 3, 4.0f32).unwrap();

        assert_eq!(msg.get_at::<f32>("readings", 0).unwrap(), 1.0);
        assert_eq!(msg.get_at::<f32>("readings", 1).unwrap(), 0.0);
        assert_eq!(msg.get_at::<f32>("readings", 3).unwrap(), 4.0);
    }

    #[test]
    fn array_index_out_of_range_fails() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();
        assert!(matches!(
            msg.set_at("readings", 4, 0.0f32),
            Err(WireError::IndexOutOfRange { index: 4, len: 4, .. })
        ));
        assert!(matches!(
            msg.get_at::<f32>("readings", 9),
            Err(WireError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn unknown_field_fails() {
        let set = heartbeat_set();
        let msg = set.create(0).unwrap();
        assert!(matches!(
            msg.get::<u8>("bogus"),
            Err(WireError::UnknownField { .. })
        ));
    }

    #[test]
    fn string_round_trip_nul_padded() {
        let set = heartbeat_set();
        let mut msg = set.create(22).unwrap();

        msg.set_str("param_id", "SR0_EXT_STAT").unwrap();
        assert_eq!(msg.get_str("param_id").unwrap(), "SR0_EXT_STAT");

        // Shorter value clears the old tail.
        msg.set_str("param_id", "X").unwrap();
        assert_eq!(msg.get_str("param_id").unwrap(), "X");
    }

    #[test]
    fn full_width_string_has_no_terminator() {
        let set = heartbeat_set();
        let mut msg = set.create(22).unwrap();
        msg.set_str("param_id", "ABCDEFGHIJKLMNOP").unwrap();
        assert_eq!(msg.get_str("param_id").unwrap(), "ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn oversized_string_fails() {
        let set = heartbeat_set();
        let mut msg = set.create(22).unwrap();
        assert!(matches!(
            msg.set_str("param_id", "ABCDEFGHIJKLMNOPQ"),
            Err(WireError::StringTooLong { len: 17, max: 16, .. })
        ));
    }

    #[test]
    fn string_access_on_numeric_field_fails() {
        let set = heartbeat_set();
        let mut msg = set.create(0).unwrap();
        assert!(matches!(
            msg.set_str("type", "x"),
            Err(WireError::ValueKindMismatch { .. })
        ));
        assert!(msg.get_str("type").is_err());
    }

    #[test]
    fn variant_accessor_matches_field_kinds() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();
        msg.set("time_usec", 42u64).unwrap();
        msg.set("delta", -3i16).unwrap();
        msg.set_at("readings", 1, 2.5f32).unwrap();

        assert_eq!(msg.field("time_usec").unwrap(), Value::UInt(42));
        assert_eq!(msg.field("delta").unwrap(), Value::Int(-3));
        assert_eq!(
            msg.field("readings").unwrap(),
            Value::FloatArray(vec![0.0, 2.5, 0.0, 0.0])
        );
    }

    #[test]
    fn variant_setter_round_trips() {
        let set = heartbeat_set();
        let mut msg = set.create(22).unwrap();

        msg.set_field("param_value", Value::Float(3.5)).unwrap();
        msg.set_field("param_id", "RATE").unwrap();
        msg.set_field("param_count", Value::UInt(12)).unwrap();

        assert_eq!(msg.field("param_value").unwrap(), Value::Float(3.5));
        assert_eq!(msg.field("param_id").unwrap(), Value::Str("RATE".into()));
        assert_eq!(msg.field("param_count").unwrap(), Value::UInt(12));
    }

    #[test]
    fn variant_array_setter_zero_fills() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();
        msg.set_field("readings", Value::FloatArray(vec![9.0, 8.0, 7.0, 6.0]))
            .unwrap();
        msg.set_field("readings", Value::FloatArray(vec![1.0]))
            .unwrap();
        assert_eq!(
            msg.field("readings").unwrap(),
            Value::FloatArray(vec![1.0, 0.0, 0.0, 0.0])
        );
    }

    #[test]
    fn variant_shape_mismatches_fail() {
        let set = heartbeat_set();
        let mut msg = set.create(31).unwrap();
        assert!(matches!(
            msg.set_field("readings", Value::Float(1.0)),
            Err(WireError::ValueKindMismatch { .. })
        ));
        assert!(matches!(
            msg.set_field("delta", Value::IntArray(vec![1])),
            Err(WireError::ValueKindMismatch { .. })
        ));
        assert!(matches!(
            msg.set_field("readings", Value::FloatArray(vec![0.0; 5])),
            Err(WireError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn version_switch_relocates_payload() {
        let set = heartbeat_set();
        let mut msg = set.create(0).unwrap();
        msg.set("custom_mode", 0x01020304u32).unwrap();
        msg.set("type", 6u8).unwrap();
        msg.header_mut().set_seq(9);

        msg.set_protocol_version(ProtocolVersion::V1);
        assert_eq!(msg.protocol_version(), ProtocolVersion::V1);
        assert_eq!(msg.header().seq(), 9);
        assert_eq!(msg.header().message_id(), 0);
        assert_eq!(msg.get::<u32>("custom_mode").unwrap(), 0x01020304);
        assert_eq!(msg.get::<u8>("type").unwrap(), 6);

        msg.set_protocol_version(ProtocolVersion::V2);
        assert_eq!(msg.get::<u32>("custom_mode").unwrap(), 0x01020304);
        assert_eq!(msg.get::<u8>("type").unwrap(), 6);
    }
}
