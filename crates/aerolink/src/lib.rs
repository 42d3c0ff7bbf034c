//! Runtime engine for a self-describing binary telemetry protocol.
//!
//! aerolink converts between schema-bound in-memory messages and their
//! wire-exact byte frames, and demultiplexes a raw byte stream into
//! per-partner sessions with liveness tracking and blocking, filtered
//! receive.
//!
//! # Crate Structure
//!
//! - [`transport`] — the [`NetworkInterface`](transport::NetworkInterface)
//!   boundary, partner identity, in-memory loopback pair
//! - [`schema`] — message definitions and the immutable registry
//! - [`frame`] — checksummed frame codec and the streaming decoder
//! - [`net`] — connections, expectations, and the network runtime
//!   (behind the `net` feature, on by default)
//! - [`dialect`] — a built-in subset of well-known telemetry messages

pub mod dialect;

/// Re-export transport types.
pub mod transport {
    pub use aerolink_transport::*;
}

/// Re-export schema types.
pub mod schema {
    pub use aerolink_schema::*;
}

/// Re-export frame codec types.
pub mod frame {
    pub use aerolink_frame::*;
}

/// Re-export connection and runtime types (requires `net` feature).
#[cfg(feature = "net")]
pub mod net {
    pub use aerolink_net::*;
}
