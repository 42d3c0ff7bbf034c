/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The interface has been closed; no further traffic will flow.
    #[error("interface closed")]
    Closed,

    /// An I/O error occurred on the underlying medium.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
