use std::fmt;

/// Wire type of a single field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    /// One byte of a fixed-width, NUL-padded character array.
    Char,
}

impl WireType {
    /// Width of one element on the wire, in bytes.
    pub fn width(self) -> usize {
        match self {
            WireType::U8 | WireType::I8 | WireType::Char => 1,
            WireType::U16 | WireType::I16 => 2,
            WireType::U32 | WireType::I32 | WireType::F32 => 4,
            WireType::U64 | WireType::I64 | WireType::F64 => 8,
        }
    }

    /// Whether the element is an IEEE-754 float.
    pub fn is_float(self) -> bool {
        matches!(self, WireType::F32 | WireType::F64)
    }

    /// Whether the element is a signed integer.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            WireType::I8 | WireType::I16 | WireType::I32 | WireType::I64
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::U8 => "uint8_t",
            WireType::U16 => "uint16_t",
            WireType::U32 => "uint32_t",
            WireType::U64 => "uint64_t",
            WireType::I8 => "int8_t",
            WireType::I16 => "int16_t",
            WireType::I32 => "int32_t",
            WireType::I64 => "int64_t",
            WireType::F32 => "float",
            WireType::F64 => "double",
            WireType::Char => "char",
        };
        f.write_str(name)
    }
}

/// One field of a message payload, at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) wire_type: WireType,
    pub(crate) array_len: usize,
    pub(crate) offset: usize,
    pub(crate) extension: bool,
}

impl FieldDef {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element wire type.
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Number of elements. `1` for scalars.
    pub fn array_len(&self) -> usize {
        self.array_len
    }

    /// Byte offset of the field within the payload.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the field was declared as an extension (may be absent from
    /// frames produced against an older definition).
    pub fn is_extension(&self) -> bool {
        self.extension
    }

    /// Total wire size of the field, in bytes.
    pub fn size(&self) -> usize {
        self.wire_type.width() * self.array_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_match_wire_sizes() {
        assert_eq!(WireType::U8.width(), 1);
        assert_eq!(WireType::Char.width(), 1);
        assert_eq!(WireType::I16.width(), 2);
        assert_eq!(WireType::F32.width(), 4);
        assert_eq!(WireType::U64.width(), 8);
        assert_eq!(WireType::F64.width(), 8);
    }

    #[test]
    fn classification() {
        assert!(WireType::F32.is_float());
        assert!(!WireType::U32.is_float());
        assert!(WireType::I8.is_signed());
        assert!(!WireType::U8.is_signed());
        assert!(!WireType::Char.is_signed());
    }

    #[test]
    fn display_uses_wire_names() {
        assert_eq!(WireType::U8.to_string(), "uint8_t");
        assert_eq!(WireType::F64.to_string(), "double");
        assert_eq!(WireType::Char.to_string(), "char");
    }
}
