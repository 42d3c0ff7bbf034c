use std::time::Duration;

use aerolink_schema::SchemaError;
use aerolink_transport::{ConnectionPartner, TransportError};

/// Errors that can occur in connection and runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A blocking operation reached its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The connection's partner has been declared dead.
    #[error("connection to {0} is dead")]
    ConnectionDead(ConnectionPartner),

    /// Codec or field-access failure.
    #[error(transparent)]
    Wire(#[from] aerolink_frame::WireError),

    /// Schema lookup failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
