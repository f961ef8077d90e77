use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::frame::Frame;
use crate::glob;
use crate::session::{message_frame, pmessage_frame, ClientId, Clients};

/// Channel and pattern subscription tables. Cheap to clone.
///
/// Both tables live under one lock so that acknowledgement counts and publish fan out observe a
/// consistent view. A name only appears in a table while at least one client is subscribed to it.
#[derive(Clone, Default)]
pub struct PubSub {
    inner: Arc<Mutex<Tables>>,
}

type Table = BTreeMap<String, HashSet<ClientId>>;

#[derive(Default)]
struct Tables {
    channels: Table,
    patterns: Table,
    /// Channels plus patterns each client is subscribed to. Clients without subscriptions have
    /// no entry.
    counts: HashMap<ClientId, usize>,
}

/// Selects one of the two subscription tables.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Channel,
    Pattern,
}

impl Kind {
    fn subscribe_reply(self) -> &'static str {
        match self {
            Kind::Channel => "subscribe",
            Kind::Pattern => "psubscribe",
        }
    }

    fn unsubscribe_reply(self) -> &'static str {
        match self {
            Kind::Channel => "unsubscribe",
            Kind::Pattern => "punsubscribe",
        }
    }
}

impl Tables {
    fn table(&mut self, kind: Kind) -> &mut Table {
        match kind {
            Kind::Channel => &mut self.channels,
            Kind::Pattern => &mut self.patterns,
        }
    }

    /// Number of channels plus patterns `id` is subscribed to.
    fn count(&self, id: &ClientId) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }

    fn subscribe(&mut self, kind: Kind, id: ClientId, names: Vec<String>) -> Vec<Frame> {
        names
            .into_iter()
            .map(|name| {
                if self.table(kind).entry(name.clone()).or_default().insert(id) {
                    *self.counts.entry(id).or_default() += 1;
                }
                ack(kind.subscribe_reply(), Some(&name), self.count(&id))
            })
            .collect()
    }

    fn unsubscribe(&mut self, kind: Kind, id: ClientId, names: Vec<String>) -> Vec<Frame> {
        let names = if names.is_empty() {
            self.table(kind)
                .iter()
                .filter(|(_, members)| members.contains(&id))
                .map(|(name, _)| name.clone())
                .collect()
        } else {
            names
        };

        if names.is_empty() {
            return vec![ack(kind.unsubscribe_reply(), None, self.count(&id))];
        }

        names
            .into_iter()
            .map(|name| {
                if remove_member(self.table(kind), &name, &id) {
                    self.decrement(&id);
                }
                ack(kind.unsubscribe_reply(), Some(&name), self.count(&id))
            })
            .collect()
    }

    fn decrement(&mut self, id: &ClientId) {
        if let Some(count) = self.counts.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(id);
            }
        }
    }
}

impl PubSub {
    pub fn new() -> PubSub {
        PubSub::default()
    }

    /// Subscribes the client to each channel, returning one acknowledgement per channel in the
    /// order given.
    pub fn subscribe(&self, id: ClientId, channels: Vec<String>) -> Vec<Frame> {
        self.lock().subscribe(Kind::Channel, id, channels)
    }

    pub fn psubscribe(&self, id: ClientId, patterns: Vec<String>) -> Vec<Frame> {
        self.lock().subscribe(Kind::Pattern, id, patterns)
    }

    /// Unsubscribes the client from each channel, or from all of its channels when none is
    /// given. Returns one acknowledgement per channel.
    pub fn unsubscribe(&self, id: ClientId, channels: Vec<String>) -> Vec<Frame> {
        self.lock().unsubscribe(Kind::Channel, id, channels)
    }

    pub fn punsubscribe(&self, id: ClientId, patterns: Vec<String>) -> Vec<Frame> {
        self.lock().unsubscribe(Kind::Pattern, id, patterns)
    }

    /// Delivers `message` to every client subscribed to `channel` or to a pattern matching it.
    ///
    /// A client receives the message once: exact subscribers get a `message` frame, clients
    /// only matched through patterns get a `pmessage` frame naming one of their matching
    /// patterns. Returns the number of clients the message was delivered to.
    pub fn publish(&self, clients: &Clients, channel: &str, message: &Bytes) -> usize {
        let tables = self.lock();
        let mut deliveries: HashMap<ClientId, Frame> = HashMap::new();

        if let Some(members) = tables.channels.get(channel) {
            for id in members {
                deliveries.insert(*id, message_frame(channel, message));
            }
        }

        for (pattern, members) in &tables.patterns {
            if !glob::matches(channel, pattern) {
                continue;
            }
            for id in members {
                deliveries
                    .entry(*id)
                    .or_insert_with(|| pmessage_frame(pattern, channel, message));
            }
        }

        // Delivered while holding the tables so a concurrent unsubscribe is acknowledged
        // either before or after this message, never in between.
        let delivered = clients.deliver(deliveries);
        debug!(channel, delivered, "published");

        delivered
    }

    /// Drops every subscription held by the client.
    pub fn remove_client(&self, id: &ClientId) {
        let mut guard = self.lock();
        let tables = &mut *guard;
        if tables.counts.remove(id).is_none() {
            return;
        }

        for table in [&mut tables.channels, &mut tables.patterns] {
            table.retain(|_, members| {
                members.remove(id);
                !members.is_empty()
            });
        }
    }

    pub fn subscription_count(&self, id: &ClientId) -> usize {
        self.lock().count(id)
    }

    /// Channels with at least one subscriber, optionally filtered by a glob pattern.
    pub fn channels(&self, pattern: Option<&str>) -> Vec<String> {
        self.lock()
            .channels
            .keys()
            .filter(|channel| pattern.map_or(true, |pattern| glob::matches(channel, pattern)))
            .cloned()
            .collect()
    }

    /// Number of exact subscribers of each channel.
    pub fn numsub(&self, channels: &[String]) -> Vec<(String, usize)> {
        let tables = self.lock();
        channels
            .iter()
            .map(|channel| {
                let count = tables.channels.get(channel).map_or(0, HashSet::len);
                (channel.clone(), count)
            })
            .collect()
    }

    /// Number of distinct patterns subscribed to.
    pub fn numpat(&self) -> usize {
        self.lock().patterns.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes `id` from the entry `name`, dropping the entry once it has no members. Returns
/// whether `id` was subscribed.
fn remove_member(table: &mut Table, name: &str, id: &ClientId) -> bool {
    let Some(members) = table.get_mut(name) else {
        return false;
    };

    let removed = members.remove(id);
    if members.is_empty() {
        table.remove(name);
    }
    removed
}

fn ack(kind: &'static str, name: Option<&str>, count: usize) -> Frame {
    let name = match name {
        Some(name) => Frame::Bulk(Bytes::copy_from_slice(name.as_bytes())),
        None => Frame::Null,
    };

    Frame::Array(vec![
        Frame::Bulk(Bytes::from_static(kind.as_bytes())),
        name,
        Frame::Integer(count as i64),
    ])
}
