use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::frame::Frame;
use crate::store::DbIndex;

pub type ClientId = Uuid;

/// Server side state of one connected client.
///
/// The session is owned by the task driving its connection; other connections reach the client
/// only through the [`Clients`] registry.
#[derive(Debug)]
pub struct Session {
    pub id: ClientId,
    pub addr: SocketAddr,
    /// The logical database commands of this session act upon.
    pub db: DbIndex,
    pub name: Option<String>,
    monitor: bool,
    closing: bool,
    // Replies emitted ahead of the current command's own reply, e.g. one acknowledgement per
    // channel for SUBSCRIBE.
    pending: Vec<Frame>,
}

impl Session {
    fn new(id: ClientId, addr: SocketAddr) -> Session {
        Session {
            id,
            addr,
            db: 0,
            name: None,
            monitor: false,
            closing: false,
            pending: Vec::new(),
        }
    }

    pub fn is_monitor(&self) -> bool {
        self.monitor
    }

    /// Marks the session to be closed once the current reply has been written.
    pub fn close(&mut self) {
        self.closing = true;
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn push_reply(&mut self, frame: Frame) {
        self.pending.push(frame);
    }

    pub fn take_replies(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.pending)
    }
}

/// Registry of live sessions and of the subset in monitor mode. Cheap to clone.
#[derive(Clone, Default)]
pub struct Clients {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    registry: Mutex<Registry>,
    // Mirrors `registry.monitors.len()` so the per-command check needs no lock.
    monitors: AtomicUsize,
}

#[derive(Default)]
struct Registry {
    live: HashMap<ClientId, Client>,
    monitors: HashSet<ClientId>,
}

struct Client {
    outbox: UnboundedSender<Frame>,
}

impl Clients {
    pub fn new() -> Clients {
        Clients::default()
    }

    /// Registers a new client and returns its session along with the receiving end of its
    /// outbox, through which pub/sub messages and monitor traces are delivered.
    pub fn connect(&self, addr: SocketAddr) -> (Session, UnboundedReceiver<Frame>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let session = Session::new(Uuid::new_v4(), addr);

        self.lock().live.insert(session.id, Client { outbox });

        (session, inbox)
    }

    /// Removes the client from the live set and from the monitor set.
    pub fn disconnect(&self, id: &ClientId) {
        let mut registry = self.lock();
        registry.live.remove(id);
        if registry.monitors.remove(id) {
            self.inner.monitors.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Puts a live session in monitor mode. Returns false if it is not live or already
    /// monitoring.
    pub fn enter_monitor(&self, session: &mut Session) -> bool {
        let mut registry = self.lock();
        if !registry.live.contains_key(&session.id) || !registry.monitors.insert(session.id) {
            return false;
        }

        self.inner.monitors.fetch_add(1, Ordering::Relaxed);
        session.monitor = true;
        true
    }

    pub fn len(&self) -> usize {
        self.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn monitor_count(&self) -> usize {
        self.inner.monitors.load(Ordering::Relaxed)
    }

    /// Delivers `["message", channel, message]` to every client in `targets`, or to every live
    /// client when no target set is given. Returns the number of clients written to.
    pub fn broadcast(
        &self,
        channel: &str,
        message: &Bytes,
        targets: Option<&HashSet<ClientId>>,
    ) -> usize {
        let frame = message_frame(channel, message);
        let registry = self.lock();

        match targets {
            Some(targets) => targets
                .iter()
                .filter(|id| registry.send(id, frame.clone()))
                .count(),
            None => registry
                .live
                .keys()
                .filter(|id| registry.send(id, frame.clone()))
                .count(),
        }
    }

    /// Delivers an individual frame to each listed client. Returns the number of clients
    /// written to; clients that are gone are skipped.
    pub fn deliver<I>(&self, deliveries: I) -> usize
    where
        I: IntoIterator<Item = (ClientId, Frame)>,
    {
        let registry = self.lock();
        deliveries
            .into_iter()
            .filter(|(id, frame)| registry.send(id, frame.clone()))
            .count()
    }

    /// Writes a trace line to every monitor session.
    pub fn trace(&self, line: String) -> usize {
        let registry = self.lock();
        let frame = Frame::Simple(line);

        registry
            .monitors
            .iter()
            .filter(|id| registry.send(id, frame.clone()))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry {
    fn send(&self, id: &ClientId, frame: Frame) -> bool {
        let Some(client) = self.live.get(id) else {
            return false;
        };

        match client.outbox.send(frame) {
            Ok(()) => true,
            Err(_) => {
                debug!(client = %id, "outbox closed, delivery skipped");
                false
            }
        }
    }
}

pub fn message_frame(channel: &str, message: &Bytes) -> Frame {
    Frame::Array(vec![
        Frame::Bulk(Bytes::from_static(b"message")),
        Frame::Bulk(Bytes::copy_from_slice(channel.as_bytes())),
        Frame::Bulk(message.clone()),
    ])
}

pub fn pmessage_frame(pattern: &str, channel: &str, message: &Bytes) -> Frame {
    Frame::Array(vec![
        Frame::Bulk(Bytes::from_static(b"pmessage")),
        Frame::Bulk(Bytes::copy_from_slice(pattern.as_bytes())),
        Frame::Bulk(Bytes::copy_from_slice(channel.as_bytes())),
        Frame::Bulk(message.clone()),
    ])
}
