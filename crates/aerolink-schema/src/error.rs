/// Errors that can occur while building or querying a message set.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No definition registered under this message id.
    #[error("unknown message id {0}")]
    UnknownMessageId(u32),

    /// No definition registered under this message name.
    #[error("unknown message name {0:?}")]
    UnknownMessageName(String),

    /// Two definitions claim the same message id.
    #[error("duplicate message id {id}: {existing:?} and {incoming:?}")]
    DuplicateMessageId {
        id: u32,
        existing: String,
        incoming: String,
    },

    /// Two definitions claim the same message name.
    #[error("duplicate message name {0:?}")]
    DuplicateMessageName(String),

    /// A message declares the same field name twice.
    #[error("message {message:?}: duplicate field {field:?}")]
    DuplicateField { message: String, field: String },

    /// The declared fields exceed the one-byte payload length limit.
    #[error("message {message:?}: payload is {size} bytes, wire limit is {max}")]
    PayloadTooLarge {
        message: String,
        size: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
