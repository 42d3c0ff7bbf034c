use aerolink_schema::SchemaError;

/// Errors that can occur while encoding frames or accessing message
/// fields.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The message's definition has no field with this name.
    #[error("message {message:?} has no field {field:?}")]
    UnknownField { message: String, field: String },

    /// Array index past the declared element count.
    #[error("field {field:?}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    /// String value longer than the field's character capacity.
    #[error("field {field:?}: string of {len} bytes exceeds capacity {max}")]
    StringTooLong {
        field: String,
        len: usize,
        max: usize,
    },

    /// A variant value of the wrong shape for the field.
    #[error("field {field:?}: expected a {expected} value")]
    ValueKindMismatch {
        field: String,
        expected: &'static str,
    },

    /// The message id does not fit the legacy single-byte id form.
    #[error("message id {id} does not fit a legacy frame")]
    IdOutOfRange { id: u32 },

    /// Schema lookup failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type Result<T> = std::result::Result<T, WireError>;
