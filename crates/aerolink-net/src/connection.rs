use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use aerolink_frame::{codec, Identifier, Message};
use aerolink_schema::MessageSet;
use aerolink_transport::{ConnectionPartner, NetworkInterface};
use tracing::{debug, warn};

use crate::error::{LinkError, Result};
use crate::expectation::Expectation;

/// Broadcast log depth: waiters slower than this many messages behind
/// the stream miss the overwritten entries.
const DELIVERY_LOG_CAPACITY: usize = 1024;

/// Opaque handle identifying a registered message callback.
pub type CallbackHandle = u64;

/// Failure reported by a message callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type MessageCallback = Box<dyn Fn(&Message) -> std::result::Result<(), CallbackError> + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&CallbackError) + Send + Sync>;

struct CallbackEntry {
    on_message: MessageCallback,
    on_error: Option<ErrorCallback>,
}

struct DeliveryLog {
    /// Index the next broadcast message will get.
    next_index: u64,
    entries: VecDeque<(u64, Arc<Message>)>,
}

/// One session with one communication partner.
///
/// Created by the [`NetworkRuntime`](crate::NetworkRuntime) on first
/// observed traffic from a partner. Outbound messages are stamped with the
/// runtime's identity and a per-connection sequence counter; inbound
/// messages are broadcast to every registered callback and every waiter
/// blocked in [`receive`](Connection::receive).
///
/// A connection is created alive and dies exactly once, when the partner
/// goes silent past the liveness window or the transport closes. A dead
/// connection is never revived; fresh traffic from the same partner makes
/// a new one.
pub struct Connection {
    partner: ConnectionPartner,
    set: Arc<MessageSet>,
    own_id: Identifier,
    interface: Arc<dyn NetworkInterface>,
    alive: AtomicBool,
    last_seen: Mutex<Instant>,
    /// Next outbound sequence number; the lock also serializes the whole
    /// encode-and-write path.
    send_seq: Mutex<u8>,
    callbacks: Mutex<HashMap<CallbackHandle, Arc<CallbackEntry>>>,
    next_handle: AtomicU64,
    inbox: Mutex<DeliveryLog>,
    inbox_ready: Condvar,
}

impl Connection {
    pub(crate) fn new(
        partner: ConnectionPartner,
        set: Arc<MessageSet>,
        own_id: Identifier,
        interface: Arc<dyn NetworkInterface>,
    ) -> Self {
        Self {
            partner,
            set,
            own_id,
            interface,
            alive: AtomicBool::new(true),
            last_seen: Mutex::new(Instant::now()),
            send_seq: Mutex::new(0),
            callbacks: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            inbox: Mutex::new(DeliveryLog {
                next_index: 0,
                entries: VecDeque::new(),
            }),
            inbox_ready: Condvar::new(),
        }
    }

    /// The physical partner behind this connection.
    pub fn partner(&self) -> &ConnectionPartner {
        &self.partner
    }

    /// Whether traffic from the partner is still arriving within the
    /// liveness window.
    pub fn alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Send a message to the partner.
    ///
    /// Stamps the outbound header with the runtime's identity and the next
    /// sequence value (wrapping at 256). Fails if the connection is dead
    /// or the transport write fails; never retried internally.
    pub fn send(&self, message: &Message) -> Result<()> {
        if !self.alive() {
            return Err(LinkError::ConnectionDead(self.partner.clone()));
        }

        let mut seq = self.send_seq.lock().expect("send lock poisoned");
        let frame = codec::encode(message, self.own_id, *seq)?;
        *seq = seq.wrapping_add(1);
        self.interface.send(&self.partner, &frame)?;
        Ok(())
    }

    /// Register a callback invoked for every message received on this
    /// connection. Returns a handle for [`remove_message_callback`].
    ///
    /// [`remove_message_callback`]: Connection::remove_message_callback
    pub fn add_message_callback<F>(&self, on_message: F) -> CallbackHandle
    where
        F: Fn(&Message) -> std::result::Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.register(Box::new(on_message), None)
    }

    /// Register a message callback together with an error hook invoked
    /// when the callback fails. The failure stays isolated to this
    /// callback; other consumers still see the message.
    pub fn add_message_callback_with_error<F, E>(
        &self,
        on_message: F,
        on_error: E,
    ) -> CallbackHandle
    where
        F: Fn(&Message) -> std::result::Result<(), CallbackError> + Send + Sync + 'static,
        E: Fn(&CallbackError) + Send + Sync + 'static,
    {
        self.register(Box::new(on_message), Some(Box::new(on_error)))
    }

    fn register(
        &self,
        on_message: MessageCallback,
        on_error: Option<ErrorCallback>,
    ) -> CallbackHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .expect("callback lock poisoned")
            .insert(
                handle,
                Arc::new(CallbackEntry {
                    on_message,
                    on_error,
                }),
            );
        handle
    }

    /// Unregister a callback. No-op if the handle was already removed.
    pub fn remove_message_callback(&self, handle: CallbackHandle) {
        self.callbacks
            .lock()
            .expect("callback lock poisoned")
            .remove(&handle);
    }

    /// Build an expectation for a message name, wildcard sender.
    pub fn expect(&self, name: &str) -> Result<Expectation> {
        Ok(Expectation::new(self.set.id_for_name(name)?))
    }

    /// Build an expectation for a message id, wildcard sender.
    pub fn expect_id(&self, id: u32) -> Expectation {
        Expectation::new(id)
    }

    /// Block until a message matching the expectation arrives.
    ///
    /// `timeout` of `None` waits indefinitely. Only messages broadcast
    /// after the call starts are considered. Concurrent receivers each
    /// observe every message independently; one incoming message can
    /// satisfy several waiters at once.
    ///
    /// Returns [`LinkError::Timeout`] on deadline expiry and
    /// [`LinkError::ConnectionDead`] if the connection dies while
    /// waiting; the two are never conflated.
    pub fn receive(&self, expectation: &Expectation, timeout: Option<Duration>) -> Result<Message> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut log = self.inbox.lock().expect("inbox lock poisoned");
        let mut cursor = log.next_index;

        loop {
            for (index, message) in log.entries.iter() {
                if *index < cursor {
                    continue;
                }
                cursor = index + 1;
                if expectation.matches(message) {
                    return Ok(Message::clone(message));
                }
            }

            if !self.alive() {
                return Err(LinkError::ConnectionDead(self.partner.clone()));
            }

            log = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(LinkError::Timeout(timeout.unwrap_or_default()));
                    }
                    let (guard, _) = self
                        .inbox_ready
                        .wait_timeout(log, deadline - now)
                        .expect("inbox lock poisoned");
                    guard
                }
                None => self.inbox_ready.wait(log).expect("inbox lock poisoned"),
            };
        }
    }

    /// Block until a message with the given name arrives.
    pub fn receive_named(&self, name: &str, timeout: Option<Duration>) -> Result<Message> {
        let expectation = self.expect(name)?;
        self.receive(&expectation, timeout)
    }

    /// Broadcast a decoded message to callbacks and waiters. Runs on the
    /// runtime's reader thread, preserving decode order.
    pub(crate) fn dispatch(&self, message: Message) {
        *self.last_seen.lock().expect("last-seen lock poisoned") = Instant::now();
        let message = Arc::new(message);

        // Snapshot entries so user callbacks run without the registry
        // lock held (a callback may add or remove callbacks).
        let entries: Vec<Arc<CallbackEntry>> = self
            .callbacks
            .lock()
            .expect("callback lock poisoned")
            .values()
            .cloned()
            .collect();
        for entry in entries {
            if let Err(err) = (entry.on_message)(&message) {
                warn!(
                    partner = %self.partner,
                    message = message.name(),
                    error = %err,
                    "message callback failed"
                );
                if let Some(on_error) = &entry.on_error {
                    on_error(&err);
                }
            }
        }

        let mut log = self.inbox.lock().expect("inbox lock poisoned");
        let index = log.next_index;
        log.next_index += 1;
        log.entries.push_back((index, message));
        if log.entries.len() > DELIVERY_LOG_CAPACITY {
            log.entries.pop_front();
        }
        self.inbox_ready.notify_all();
    }

    /// Transition to dead. Returns `true` on the first (and only
    /// effective) call, so lost-callbacks fire exactly once.
    pub(crate) fn mark_dead(&self) -> bool {
        let was_alive = self.alive.swap(false, Ordering::AcqRel);
        if was_alive {
            debug!(partner = %self.partner, "connection marked dead");
            // Wake blocked receivers so they observe the death.
            let _log = self.inbox.lock().expect("inbox lock poisoned");
            self.inbox_ready.notify_all();
        }
        was_alive
    }

    /// Instant of the most recent traffic from the partner.
    pub(crate) fn last_seen(&self) -> Instant {
        *self.last_seen.lock().expect("last-seen lock poisoned")
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("partner", &self.partner)
            .field("alive", &self.alive())
            .finish()
    }
}
