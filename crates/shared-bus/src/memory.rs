//! In-process bus implementation.
//!
//! Exact-subject fan-out over per-subscription channels. One bus handle is
//! shared by every connection it issues; a connection can be closed (or the
//! whole bus severed) without touching the others, which is what lets tests
//! and the single-process runtime exercise the same outage behavior a real
//! deployment sees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::error::BusError;
use crate::message::BusMessage;
use crate::transport::{BusConnection, BusTransport, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

struct TopicSender {
    conn_id: u64,
    tx: mpsc::Sender<BusMessage>,
}

struct BusInner {
    /// Live subscription senders, keyed by exact subject.
    topics: RwLock<HashMap<String, Vec<TopicSender>>>,
    /// Closed flag per issued connection.
    connections: RwLock<HashMap<u64, Arc<AtomicBool>>>,
    next_conn_id: AtomicU64,
    messages_published: AtomicU64,
    messages_dropped: AtomicU64,
    capacity: usize,
}

impl BusInner {
    fn deliver(&self, message: &BusMessage) -> usize {
        let senders: Vec<mpsc::Sender<BusMessage>> = {
            let topics = self.topics.read();
            match topics.get(&message.subject) {
                Some(list) => list.iter().map(|s| s.tx.clone()).collect(),
                None => Vec::new(),
            }
        };

        let mut delivered = 0;
        let mut saw_stale = false;
        for tx in senders {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subject = %message.subject, "Subscriber buffer full, message dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => saw_stale = true,
            }
        }

        if saw_stale {
            let mut topics = self.topics.write();
            if let Some(list) = topics.get_mut(&message.subject) {
                list.retain(|s| !s.tx.is_closed());
                if list.is_empty() {
                    topics.remove(&message.subject);
                }
            }
        }

        delivered
    }

    fn drop_connection(&self, conn_id: u64) {
        let mut topics = self.topics.write();
        topics.retain(|_, list| {
            list.retain(|s| s.conn_id != conn_id);
            !list.is_empty()
        });
        self.connections.write().remove(&conn_id);
    }
}

/// In-memory implementation of the bus.
///
/// Cheap to clone; all clones share the same topic table. Suitable for
/// single-process operation and tests; distributed deployments use the NATS
/// transport instead.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl InMemoryBus {
    /// Create a bus with the default per-subscription buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus with a specific per-subscription buffer size.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                connections: RwLock::new(HashMap::new()),
                next_conn_id: AtomicU64::new(0),
                messages_published: AtomicU64::new(0),
                messages_dropped: AtomicU64::new(0),
                capacity,
            }),
        }
    }

    /// Close every issued connection at once, ending all subscription
    /// streams. Simulates a bus outage; fresh `connect` calls succeed again
    /// immediately.
    pub fn sever_all(&self) {
        let flags: Vec<Arc<AtomicBool>> = {
            let conns = self.inner.connections.read();
            conns.values().cloned().collect()
        };
        for flag in flags {
            flag.store(true, Ordering::SeqCst);
        }
        self.inner.topics.write().clear();
        self.inner.connections.write().clear();
        warn!("In-memory bus severed all connections");
    }

    /// Total messages accepted for delivery.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.inner.messages_published.load(Ordering::Relaxed)
    }

    /// Messages published with no live subscriber on the subject.
    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.inner.messages_dropped.load(Ordering::Relaxed)
    }

    /// Number of live subscriptions across all subjects.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.topics.read().values().map(Vec::len).sum()
    }

    /// Number of connections issued and not yet closed.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.connections.read().len()
    }

    /// Per-subscription buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusTransport for InMemoryBus {
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, BusError> {
        let id = self.inner.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let closed = Arc::new(AtomicBool::new(false));
        self.inner.connections.write().insert(id, closed.clone());
        debug!(conn_id = id, "In-memory connection opened");
        Ok(Arc::new(InMemoryConnection {
            id,
            closed,
            bus: self.inner.clone(),
        }))
    }
}

/// One connection handed out by [`InMemoryBus`].
pub struct InMemoryConnection {
    id: u64,
    closed: Arc<AtomicBool>,
    bus: Arc<BusInner>,
}

#[async_trait]
impl BusConnection for InMemoryConnection {
    async fn publish(&self, message: BusMessage) -> Result<(), BusError> {
        if !self.is_open() {
            return Err(BusError::Closed);
        }

        self.bus.messages_published.fetch_add(1, Ordering::Relaxed);
        let delivered = self.bus.deliver(&message);
        if delivered == 0 {
            self.bus.messages_dropped.fetch_add(1, Ordering::Relaxed);
            warn!(subject = %message.subject, "Message dropped (no subscribers)");
        } else {
            debug!(subject = %message.subject, receivers = delivered, "Message published");
        }
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        if !self.is_open() {
            return Err(BusError::Closed);
        }

        let (tx, rx) = mpsc::channel(self.bus.capacity);
        self.bus
            .topics
            .write()
            .entry(subject.to_string())
            .or_default()
            .push(TopicSender {
                conn_id: self.id,
                tx,
            });
        debug!(conn_id = self.id, subject, "Subscription created");
        Ok(Subscription::new(subject, ReceiverStream::new(rx).boxed()))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.bus.drop_connection(self.id);
        debug!(conn_id = self.id, "In-memory connection closed");
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}
