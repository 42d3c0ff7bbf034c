use crate::error::Result;
use crate::partner::ConnectionPartner;

/// A physical interface carrying protocol traffic.
///
/// This is the boundary the network runtime drives. Implementations wrap a
/// concrete medium (UDP socket, TCP stream, serial port, in-memory pair)
/// and expose three operations: send bytes to a partner, block until bytes
/// arrive from some partner, and close.
///
/// All three methods take `&self`: the runtime calls `receive` from its
/// reader thread while application threads call `send` concurrently, so
/// implementations carry their own interior synchronization.
pub trait NetworkInterface: Send + Sync {
    /// Send raw bytes to the given partner.
    fn send(&self, partner: &ConnectionPartner, data: &[u8]) -> Result<()>;

    /// Block until bytes arrive, filling `buf` and returning the byte
    /// count together with the originating partner.
    ///
    /// Returns [`TransportError::Closed`](crate::TransportError::Closed)
    /// once the interface has been closed; the runtime uses that to stop
    /// its reader thread.
    fn receive(&self, buf: &mut [u8]) -> Result<(usize, ConnectionPartner)>;

    /// Close the interface. Unblocks any pending `receive`.
    fn close(&self);

    /// For point-to-point interfaces (clients, serial links), the partner
    /// reachable before any inbound traffic. Server-style interfaces
    /// return `None`.
    ///
    /// The runtime uses this to stream its heartbeat at a partner that
    /// has not spoken yet; servers only learn partners from traffic.
    fn default_partner(&self) -> Option<ConnectionPartner> {
        None
    }
}
