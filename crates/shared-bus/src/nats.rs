//! NATS transport adapter.
//!
//! Thin mapping from the transport traits onto `async-nats`: subjects map to
//! NATS subjects, `reply_to` maps to the protocol's reply field. Reconnect
//! policy is owned by the caller (the RPC client), so connects here fail
//! fast instead of retrying internally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_nats::{Client, ConnectOptions, Event};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{info, warn};

use crate::error::BusError;
use crate::message::BusMessage;
use crate::transport::{BusConnection, BusTransport, Subscription};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

async fn handle_event(event: Event) {
    match event {
        Event::Connected => info!("NATS connected"),
        Event::Disconnected => warn!("NATS disconnected - will attempt reconnect"),
        Event::ServerError(err) => warn!(error = %err, "NATS server error"),
        Event::ClientError(err) => warn!(error = %err, "NATS client error"),
        Event::SlowConsumer(sid) => warn!(sid, "NATS slow consumer detected"),
        Event::LameDuckMode => warn!("NATS server entering lame duck mode"),
        Event::Closed => info!("NATS connection closed"),
        Event::Draining => info!("NATS connection draining"),
    }
}

/// Connection factory for a NATS deployment.
pub struct NatsTransport {
    servers: Vec<String>,
}

impl NatsTransport {
    #[must_use]
    pub fn new(servers: Vec<String>) -> Self {
        Self { servers }
    }

    /// Server addresses this transport dials.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

#[async_trait]
impl BusTransport for NatsTransport {
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, BusError> {
        let client = ConnectOptions::new()
            .connection_timeout(CONNECTION_TIMEOUT)
            .event_callback(|event| async move { handle_event(event).await })
            .connect(&self.servers)
            .await
            .map_err(|e| BusError::Connect(e.to_string()))?;

        info!(servers = ?self.servers, "Connected to NATS");
        Ok(Arc::new(NatsConnection {
            client,
            closed: AtomicBool::new(false),
        }))
    }
}

/// One live NATS connection.
pub struct NatsConnection {
    client: Client,
    closed: AtomicBool,
}

#[async_trait]
impl BusConnection for NatsConnection {
    async fn publish(&self, message: BusMessage) -> Result<(), BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let result = match message.reply_to {
            Some(reply) => {
                self.client
                    .publish_with_reply(message.subject, reply, message.payload)
                    .await
            }
            None => self.client.publish(message.subject, message.payload).await,
        };
        result.map_err(|e| BusError::Publish(e.to_string()))?;

        // Push the write out now; RPC latency matters more than batching here.
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }

    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::Subscribe(e.to_string()))?;

        let stream = subscriber
            .map(|msg| BusMessage {
                subject: msg.subject.to_string(),
                reply_to: msg.reply.map(|r| r.to_string()),
                payload: msg.payload,
            })
            .boxed();
        Ok(Subscription::new(subject, stream))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "Flush on close failed");
        }
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
            && self.client.connection_state() == async_nats::connection::State::Connected
    }
}
