//! Correlated request/reply over the message bus.
//!
//! Call flow:
//! 1. Ensure a live connection, reconnecting a bounded number of times when
//!    the previous one died (skipped under `fail_fast`).
//! 2. Register the call in the pending table and keep the one-shot receiver.
//! 3. Publish the request with this client's reply inbox as the reply-to
//!    subject. A publish failure triggers one reconnect-and-retry, after
//!    which the call fails as unavailable.
//! 4. Await the receiver under whatever remains of the call deadline. The
//!    deadline starts when the call is issued and never pauses, so time
//!    spent reconnecting counts against it.
//! 5. On expiry, cancel the table entry. A reply that arrives afterwards
//!    finds no entry and is dropped by the listener as a no-op.
//!
//! One reply inbox serves the whole client; the correlation id inside each
//! envelope picks the waiting caller.

use serde_json::Value;
use shared_bus::{BusConnection, BusMessage, BusTransport, Subscription};
use shared_types::{EnvelopeError, ReplyEnvelope, ReplyError, RequestEnvelope};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::RpcConfig;
use crate::rpc::pending::{PendingCallStore, PendingStatsSnapshot};

/// Why a bus call did not produce a success payload.
#[derive(Debug, Error)]
pub enum CallError {
    /// No reply arrived before the deadline.
    #[error("call to {subject} timed out after {after:?}")]
    Timeout { subject: String, after: Duration },

    /// The bus could not be reached, or the request could not be delivered.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// The responder answered with an error envelope.
    #[error(transparent)]
    Rejected(#[from] ReplyError),

    /// The request envelope failed to encode.
    #[error(transparent)]
    Codec(#[from] EnvelopeError),
}

/// Bridge from request/response callers onto the publish/subscribe bus.
///
/// Cheap to share behind an `Arc`; all state is internally synchronized.
pub struct RpcClient {
    transport: Arc<dyn BusTransport>,
    conn: Mutex<Option<Arc<dyn BusConnection>>>,
    pending: Arc<PendingCallStore>,
    inbox: String,
    config: RpcConfig,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn BusTransport>, config: RpcConfig) -> Self {
        let inbox = format!("gateway.reply.{}", shared_types::CorrelationId::new());
        Self {
            transport,
            conn: Mutex::new(None),
            pending: Arc::new(PendingCallStore::new(config.call_timeout)),
            inbox,
            config,
        }
    }

    /// The reply subject this client listens on.
    #[must_use]
    pub fn inbox(&self) -> &str {
        &self.inbox
    }

    /// The pending table, shared so the owner can run the cleanup sweep.
    #[must_use]
    pub fn pending_store(&self) -> Arc<PendingCallStore> {
        Arc::clone(&self.pending)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    #[must_use]
    pub fn stats(&self) -> PendingStatsSnapshot {
        self.pending.stats()
    }

    /// Establishes the connection up front instead of on the first call.
    pub async fn connect(&self) -> Result<(), CallError> {
        self.connection().await.map(|_| ())
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.as_ref().is_some_and(|c| c.is_open())
    }

    /// Closes the connection; in-flight calls resolve as their deadlines
    /// expire.
    pub async fn shutdown(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            conn.close().await;
        }
    }

    /// Issues one request and awaits its correlated reply.
    ///
    /// `timeout` overrides the configured per-call deadline.
    #[instrument(skip(self, payload))]
    pub async fn call(
        &self,
        subject: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, CallError> {
        let deadline = timeout.unwrap_or(self.config.call_timeout);
        let started = Instant::now();

        let conn = self.connection().await?;

        let (id, reply_rx) = self.pending.register(subject, Some(deadline));
        debug!(subject, %id, "Issuing bus call");

        let bytes = match RequestEnvelope::with_id(id, payload).to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                self.pending.cancel(&id);
                return Err(CallError::Codec(e));
            }
        };
        let message = BusMessage::with_reply(subject, self.inbox.clone(), bytes);

        if let Err(first) = conn.publish(message.clone()).await {
            if self.config.fail_fast {
                self.pending.cancel(&id);
                return Err(CallError::Unavailable(first.to_string()));
            }
            warn!(subject, error = %first, "Publish failed, reconnecting once");
            let conn = match self.force_reconnect().await {
                Ok(conn) => conn,
                Err(e) => {
                    self.pending.cancel(&id);
                    return Err(e);
                }
            };
            if let Err(second) = conn.publish(message).await {
                self.pending.cancel(&id);
                return Err(CallError::Unavailable(second.to_string()));
            }
        }

        let remaining = deadline.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply.into_result()?),
            Ok(Err(_closed)) => {
                // The sweep evicted the entry, or the client shut down.
                Err(CallError::Unavailable("reply channel closed".to_string()))
            }
            Err(_elapsed) => {
                self.pending.cancel(&id);
                debug!(subject, %id, "Call deadline expired");
                Err(CallError::Timeout {
                    subject: subject.to_string(),
                    after: deadline,
                })
            }
        }
    }

    /// Returns the live connection, establishing one if necessary. Under
    /// `fail_fast` a dead connection is an immediate error; a client that
    /// never connected still gets its first attempt.
    async fn connection(&self) -> Result<Arc<dyn BusConnection>, CallError> {
        let mut slot = self.conn.lock().await;
        if let Some(existing) = slot.as_ref() {
            if existing.is_open() {
                return Ok(Arc::clone(existing));
            }
            if self.config.fail_fast {
                return Err(CallError::Unavailable("bus connection is down".to_string()));
            }
        }
        self.connect_locked(&mut slot).await
    }

    /// Reconnects regardless of `fail_fast`; used after a publish failed on
    /// a connection that still looked open.
    async fn force_reconnect(&self) -> Result<Arc<dyn BusConnection>, CallError> {
        let mut slot = self.conn.lock().await;
        if let Some(existing) = slot.as_ref() {
            // Another caller reconnected while we waited for the lock.
            if existing.is_open() {
                return Ok(Arc::clone(existing));
            }
        }
        self.connect_locked(&mut slot).await
    }

    async fn connect_locked(
        &self,
        slot: &mut Option<Arc<dyn BusConnection>>,
    ) -> Result<Arc<dyn BusConnection>, CallError> {
        let attempts = self.config.max_reconnects.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.transport.connect().await {
                Ok(conn) => match conn.subscribe(&self.inbox).await {
                    Ok(sub) => {
                        self.spawn_reply_listener(sub);
                        info!(attempt, inbox = %self.inbox, "Bus connection established");
                        *slot = Some(Arc::clone(&conn));
                        return Ok(conn);
                    }
                    Err(e) => {
                        last_error = e.to_string();
                        conn.close().await;
                    }
                },
                Err(e) => last_error = e.to_string(),
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.reconnect_wait).await;
            }
        }

        warn!(attempts, error = %last_error, "Bus unreachable");
        *slot = None;
        Err(CallError::Unavailable(last_error))
    }

    /// Routes every reply on the inbox to its pending call. Exits when the
    /// owning connection closes; each fresh connection gets a fresh listener.
    fn spawn_reply_listener(&self, mut sub: Subscription) {
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            while let Some(msg) = sub.next().await {
                match ReplyEnvelope::from_bytes(&msg.payload) {
                    Ok(reply) => {
                        let id = reply.id;
                        if !pending.complete(&id, reply) {
                            debug!(%id, "Dropping reply with no pending call");
                        }
                    }
                    Err(error) => warn!(%error, "Discarding undecodable reply"),
                }
            }
            debug!("Reply stream ended");
        });
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("inbox", &self.inbox)
            .field("pending", &self.pending.pending_count())
            .field("config", &self.config)
            .finish()
    }
}
