use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use aerolink_frame::{codec, DecoderEvent, Identifier, Message, StreamDecoder};
use aerolink_schema::MessageSet;
use aerolink_transport::{ConnectionPartner, NetworkInterface, TransportError};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{LinkError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Tunables for the runtime's background behavior.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Period between heartbeat emissions, when a heartbeat is set.
    pub heartbeat_interval: Duration,
    /// Silence tolerated from a partner before its connection is
    /// declared dead.
    pub liveness_timeout: Duration,
    /// Cadence of the housekeeping pass (heartbeat + liveness scan).
    pub housekeeping_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(1),
            liveness_timeout: Duration::from_secs(3),
            housekeeping_interval: Duration::from_millis(100),
        }
    }
}

type ConnectionCallback = Box<dyn Fn(&Arc<Connection>) + Send>;

struct PartnerTable {
    map: HashMap<ConnectionPartner, Arc<Connection>>,
    /// Most recently registered connection, cleared when it is evicted.
    /// `await_connection` watches this slot.
    latest: Option<Arc<Connection>>,
}

struct RuntimeInner {
    own_id: Identifier,
    set: Arc<MessageSet>,
    interface: Arc<dyn NetworkInterface>,
    config: RuntimeConfig,
    partners: Mutex<PartnerTable>,
    partner_registered: Condvar,
    heartbeat: Mutex<Option<Message>>,
    /// Sequence counter for heartbeats sent before the point-to-point
    /// partner has a connection.
    heartbeat_seq: Mutex<u8>,
    on_connection: Mutex<Vec<ConnectionCallback>>,
    on_connection_lost: Mutex<Vec<ConnectionCallback>>,
    running: AtomicBool,
}

/// The dispatcher driving one [`NetworkInterface`].
///
/// Owns two background threads: a reader that pulls bytes from the
/// interface, feeds per-partner stream decoders, and routes decoded
/// messages to connections (creating them on first contact), and a
/// housekeeper that emits the optional heartbeat and expires partners
/// that have gone silent past the liveness window.
///
/// Dropping the runtime shuts both threads down and closes the
/// interface.
pub struct NetworkRuntime {
    inner: Arc<RuntimeInner>,
    reader: Option<JoinHandle<()>>,
    housekeeper: Option<JoinHandle<()>>,
}

impl NetworkRuntime {
    /// Runtime with the default identity (97/97) and default config.
    pub fn new(set: Arc<MessageSet>, interface: Arc<dyn NetworkInterface>) -> Self {
        Self::with_config(Identifier::default(), set, interface, RuntimeConfig::default())
    }

    /// Runtime with an explicit identity, stamped into every sent
    /// message.
    pub fn with_identity(
        own_id: Identifier,
        set: Arc<MessageSet>,
        interface: Arc<dyn NetworkInterface>,
    ) -> Self {
        Self::with_config(own_id, set, interface, RuntimeConfig::default())
    }

    /// Runtime with explicit identity and tunables.
    pub fn with_config(
        own_id: Identifier,
        set: Arc<MessageSet>,
        interface: Arc<dyn NetworkInterface>,
        config: RuntimeConfig,
    ) -> Self {
        let inner = Arc::new(RuntimeInner {
            own_id,
            set,
            interface,
            config,
            partners: Mutex::new(PartnerTable {
                map: HashMap::new(),
                latest: None,
            }),
            partner_registered: Condvar::new(),
            heartbeat: Mutex::new(None),
            heartbeat_seq: Mutex::new(0),
            on_connection: Mutex::new(Vec::new()),
            on_connection_lost: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
        });

        let reader = {
            let inner = Arc::clone(&inner);
            thread::spawn(move || reader_loop(&inner))
        };
        let housekeeper = {
            let inner = Arc::clone(&inner);
            thread::spawn(move || housekeeping_loop(&inner))
        };

        Self {
            inner,
            reader: Some(reader),
            housekeeper: Some(housekeeper),
        }
    }

    /// The identity stamped into outbound messages.
    pub fn own_id(&self) -> Identifier {
        self.inner.own_id
    }

    /// Start (or replace) the streamed heartbeat message.
    pub fn set_heartbeat(&self, message: Message) {
        *self
            .inner
            .heartbeat
            .lock()
            .expect("heartbeat lock poisoned") = Some(message);
    }

    /// Stop streaming the heartbeat.
    pub fn clear_heartbeat(&self) {
        *self
            .inner
            .heartbeat
            .lock()
            .expect("heartbeat lock poisoned") = None;
    }

    /// Register a callback fired when a new partner is detected.
    pub fn on_connection<F>(&self, callback: F)
    where
        F: Fn(&Arc<Connection>) + Send + 'static,
    {
        self.inner
            .on_connection
            .lock()
            .expect("callback lock poisoned")
            .push(Box::new(callback));
    }

    /// Register a callback fired when a partner goes silent past the
    /// liveness window. Fires exactly once per connection.
    pub fn on_connection_lost<F>(&self, callback: F)
    where
        F: Fn(&Arc<Connection>) + Send + 'static,
    {
        self.inner
            .on_connection_lost
            .lock()
            .expect("callback lock poisoned")
            .push(Box::new(callback));
    }

    /// Block until a partner is registered, returning its connection.
    ///
    /// Returns immediately if a partner is already registered; otherwise
    /// waits for the next registration or the timeout, whichever comes
    /// first.
    pub fn await_connection(&self, timeout: Duration) -> Result<Arc<Connection>> {
        let deadline = Instant::now() + timeout;
        let mut table = self.inner.partners.lock().expect("partner lock poisoned");

        loop {
            if let Some(connection) = table.latest.clone() {
                return Ok(connection);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(LinkError::Timeout(timeout));
            }
            let (guard, _) = self
                .inner
                .partner_registered
                .wait_timeout(table, deadline - now)
                .expect("partner lock poisoned");
            table = guard;
        }
    }

    /// Connection for a partner, if one is currently registered.
    pub fn connection(&self, partner: &ConnectionPartner) -> Option<Arc<Connection>> {
        self.inner
            .partners
            .lock()
            .expect("partner lock poisoned")
            .map
            .get(partner)
            .cloned()
    }

    /// All currently registered connections.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.inner
            .partners
            .lock()
            .expect("partner lock poisoned")
            .map
            .values()
            .cloned()
            .collect()
    }

    /// Stop both background threads and close the interface. Connections
    /// are marked dead so blocked receivers return promptly.
    pub fn shutdown(&mut self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("shutting down network runtime");
        self.inner.interface.close();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.housekeeper.take() {
            let _ = handle.join();
        }
        for connection in self.connections() {
            connection.mark_dead();
        }
    }
}

impl Drop for NetworkRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(inner: &Arc<RuntimeInner>) {
    let mut decoders: HashMap<ConnectionPartner, StreamDecoder> = HashMap::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    while inner.running.load(Ordering::Acquire) {
        let (read, partner) = match inner.interface.receive(&mut chunk) {
            Ok(result) => result,
            Err(TransportError::Closed) => {
                debug!("interface closed, reader stopping");
                break;
            }
            Err(err) => {
                warn!(error = %err, "transport receive failed, reader stopping");
                break;
            }
        };

        let decoder = decoders
            .entry(partner.clone())
            .or_insert_with(|| StreamDecoder::new(Arc::clone(&inner.set)));
        decoder.push(&chunk[..read]);

        while let Some(event) = decoder.next_event() {
            match event {
                DecoderEvent::Message(message) => deliver(inner, &partner, message),
                DecoderEvent::UnknownMessage { id, len } => {
                    warn!(partner = %partner, id, len, "unknown message id on stream");
                }
            }
        }
    }

    // Partners cannot outlive the stream that fed them.
    let connections: Vec<Arc<Connection>> = {
        let table = inner.partners.lock().expect("partner lock poisoned");
        table.map.values().cloned().collect()
    };
    for connection in connections {
        connection.mark_dead();
    }
}

fn deliver(inner: &Arc<RuntimeInner>, partner: &ConnectionPartner, message: Message) {
    let (connection, created) = {
        let mut table = inner.partners.lock().expect("partner lock poisoned");
        match table.map.get(partner) {
            Some(connection) => (Arc::clone(connection), false),
            None => {
                let connection = Arc::new(Connection::new(
                    partner.clone(),
                    Arc::clone(&inner.set),
                    inner.own_id,
                    Arc::clone(&inner.interface),
                ));
                table.map.insert(partner.clone(), Arc::clone(&connection));
                table.latest = Some(Arc::clone(&connection));
                (connection, true)
            }
        }
    };

    if created {
        info!(partner = %partner, "new connection partner");
        inner.partner_registered.notify_all();
        let callbacks = inner
            .on_connection
            .lock()
            .expect("callback lock poisoned");
        for callback in callbacks.iter() {
            callback(&connection);
        }
    }

    connection.dispatch(message);
}

/// Send the heartbeat to every alive connection. A point-to-point
/// partner that has not spoken yet has no connection; it still gets the
/// heartbeat, raw over the interface, so the remote end can detect us.
fn emit_heartbeat(inner: &Arc<RuntimeInner>, heartbeat: &Message) {
    let default_partner = inner.interface.default_partner();
    let connections: Vec<Arc<Connection>> = {
        let table = inner.partners.lock().expect("partner lock poisoned");
        table.map.values().cloned().collect()
    };

    let mut default_partner_covered = false;
    for connection in connections {
        if !connection.alive() {
            continue;
        }
        if default_partner.as_ref() == Some(connection.partner()) {
            default_partner_covered = true;
        }
        if let Err(err) = connection.send(heartbeat) {
            warn!(
                partner = %connection.partner(),
                error = %err,
                "heartbeat send failed"
            );
        }
    }

    if let Some(partner) = default_partner {
        if !default_partner_covered {
            let mut seq = inner
                .heartbeat_seq
                .lock()
                .expect("heartbeat lock poisoned");
            match codec::encode(heartbeat, inner.own_id, *seq) {
                Ok(frame) => {
                    *seq = seq.wrapping_add(1);
                    if let Err(err) = inner.interface.send(&partner, &frame) {
                        warn!(partner = %partner, error = %err, "heartbeat send failed");
                    }
                }
                Err(err) => warn!(error = %err, "heartbeat encode failed"),
            }
        }
    }
}

fn housekeeping_loop(inner: &Arc<RuntimeInner>) {
    let mut last_heartbeat = Instant::now();

    while inner.running.load(Ordering::Acquire) {
        thread::sleep(inner.config.housekeeping_interval);
        if !inner.running.load(Ordering::Acquire) {
            break;
        }

        // Heartbeat emission runs on this thread's own schedule, not
        // driven by inbound traffic.
        if last_heartbeat.elapsed() >= inner.config.heartbeat_interval {
            let heartbeat = inner
                .heartbeat
                .lock()
                .expect("heartbeat lock poisoned")
                .clone();
            if let Some(heartbeat) = heartbeat {
                last_heartbeat = Instant::now();
                emit_heartbeat(inner, &heartbeat);
            }
        }

        // Liveness scan: expire partners that have gone silent.
        let expired: Vec<(ConnectionPartner, Arc<Connection>)> = {
            let table = inner.partners.lock().expect("partner lock poisoned");
            table
                .map
                .iter()
                .filter(|(_, connection)| {
                    connection.last_seen().elapsed() > inner.config.liveness_timeout
                })
                .map(|(partner, connection)| (partner.clone(), Arc::clone(connection)))
                .collect()
        };

        for (partner, connection) in expired {
            if !connection.mark_dead() {
                continue;
            }
            info!(partner = %partner, "connection lost (liveness timeout)");
            {
                let mut table = inner.partners.lock().expect("partner lock poisoned");
                table.map.remove(&partner);
                if table
                    .latest
                    .as_ref()
                    .is_some_and(|latest| Arc::ptr_eq(latest, &connection))
                {
                    table.latest = None;
                }
            }
            let callbacks = inner
                .on_connection_lost
                .lock()
                .expect("callback lock poisoned");
            for callback in callbacks.iter() {
                callback(&connection);
            }
        }
    }
}
