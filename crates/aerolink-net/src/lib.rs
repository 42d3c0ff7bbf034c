//! Connection and session layer.
//!
//! [`NetworkRuntime`] owns the background machinery of one interface:
//! a reader thread that pulls raw bytes from the transport, reassembles
//! and verifies frames, and routes decoded messages to a [`Connection`]
//! per communication partner (creating one on first contact), plus a
//! housekeeping thread that streams the optional heartbeat and expires
//! partners that have gone silent.
//!
//! A [`Connection`] is one session with one partner: it stamps and
//! sequences outbound messages, fans incoming messages out to registered
//! callbacks, and supports blocking, filtered receive through
//! [`Expectation`] values. Delivery is publish/subscribe: every waiter
//! and every callback observes every message, in decode order.

pub mod connection;
pub mod error;
pub mod expectation;
pub mod runtime;

pub use connection::{CallbackError, CallbackHandle, Connection};
pub use error::{LinkError, Result};
pub use expectation::Expectation;
pub use runtime::{NetworkRuntime, RuntimeConfig};
