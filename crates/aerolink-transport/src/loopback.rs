use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::interface::NetworkInterface;
use crate::partner::ConnectionPartner;

/// One endpoint of a connected in-memory pair.
///
/// [`LoopbackInterface::pair`] returns two interfaces wired back to back:
/// bytes sent on one side arrive at the other, with datagram boundaries
/// preserved. Point-to-point, like a serial link: each side sees exactly
/// one partner.
///
/// Used by the test suites and demos; production code plugs real
/// interfaces into the same [`NetworkInterface`] seam.
pub struct LoopbackInterface {
    /// Queue this side reads from.
    rx: Arc<Mailbox>,
    /// Queue the remote side reads from.
    tx: Arc<Mailbox>,
    /// How the remote shows up in our partner table.
    remote: ConnectionPartner,
}

struct Mailbox {
    queue: Mutex<MailboxState>,
    ready: Condvar,
}

struct MailboxState {
    datagrams: VecDeque<Bytes>,
    closed: bool,
}

impl Mailbox {
    fn new() -> Self {
        Self {
            queue: Mutex::new(MailboxState {
                datagrams: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }
}

impl LoopbackInterface {
    /// Create a connected pair of loopback interfaces.
    pub fn pair() -> (Self, Self) {
        let a_inbox = Arc::new(Mailbox::new());
        let b_inbox = Arc::new(Mailbox::new());

        let a = Self {
            rx: Arc::clone(&a_inbox),
            tx: Arc::clone(&b_inbox),
            remote: ConnectionPartner::new("loopback", 1),
        };
        let b = Self {
            rx: b_inbox,
            tx: a_inbox,
            remote: ConnectionPartner::new("loopback", 0),
        };
        (a, b)
    }

    /// The partner identity of the remote end.
    pub fn remote_partner(&self) -> &ConnectionPartner {
        &self.remote
    }
}

impl NetworkInterface for LoopbackInterface {
    fn send(&self, _partner: &ConnectionPartner, data: &[u8]) -> Result<()> {
        let mut state = self.tx.queue.lock().expect("loopback lock poisoned");
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.datagrams.push_back(Bytes::copy_from_slice(data));
        self.tx.ready.notify_all();
        Ok(())
    }

    fn receive(&self, buf: &mut [u8]) -> Result<(usize, ConnectionPartner)> {
        let mut state = self.rx.queue.lock().expect("loopback lock poisoned");
        loop {
            if let Some(datagram) = state.datagrams.pop_front() {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                return Ok((n, self.remote.clone()));
            }
            if state.closed {
                return Err(TransportError::Closed);
            }
            state = self
                .rx
                .ready
                .wait(state)
                .expect("loopback lock poisoned");
        }
    }

    fn close(&self) {
        debug!("closing loopback interface");
        // A closed pair carries no traffic in either direction.
        for mailbox in [&self.rx, &self.tx] {
            let mut state = mailbox.queue.lock().expect("loopback lock poisoned");
            state.closed = true;
            mailbox.ready.notify_all();
        }
    }

    fn default_partner(&self) -> Option<ConnectionPartner> {
        Some(self.remote.clone())
    }
}
