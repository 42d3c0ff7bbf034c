//! Transport boundary for the aerolink protocol engine.
//!
//! The protocol core is transport-agnostic: it consumes raw bytes plus
//! enough partner-identifying metadata to key a partner table, and it
//! produces raw bytes addressed to a partner. This crate defines that
//! boundary ([`NetworkInterface`]), the partner identity type
//! ([`ConnectionPartner`]), and an in-memory point-to-point implementation
//! ([`LoopbackInterface`]) used by tests and demos.
//!
//! Concrete UDP/TCP/serial interfaces implement [`NetworkInterface`]
//! outside this workspace.

pub mod error;
pub mod interface;
pub mod loopback;
pub mod partner;

pub use error::{Result, TransportError};
pub use interface::NetworkInterface;
pub use loopback::LoopbackInterface;
pub use partner::ConnectionPartner;
