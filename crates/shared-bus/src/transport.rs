//! Transport traits and the subscription handle.
//!
//! `BusTransport` is the factory seam: the RPC client calls `connect` again
//! after losing a connection, and tests substitute the in-memory bus for the
//! real thing. `BusConnection` is one live link; all of its subscriptions
//! end when it closes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use crate::error::BusError;
use crate::message::BusMessage;

/// Factory producing live connections to the bus.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Establish a fresh connection.
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, BusError>;
}

/// One live connection to the bus.
#[async_trait]
pub trait BusConnection: Send + Sync {
    /// Publish a message. Succeeds even when nobody is subscribed to the
    /// subject; an RPC over a deserted subject simply times out.
    async fn publish(&self, message: BusMessage) -> Result<(), BusError>;

    /// Subscribe to a subject. Exact match, no wildcards.
    async fn subscribe(&self, subject: &str) -> Result<Subscription, BusError>;

    /// Close the connection. Publishing afterwards fails with
    /// [`BusError::Closed`] and every subscription stream ends.
    async fn close(&self);

    /// Whether the connection is still usable.
    fn is_open(&self) -> bool;
}

/// A stream of messages for one subject.
///
/// Yields `None` when the owning connection closes. Implements [`Stream`],
/// so subscriptions can be merged with the usual combinators.
pub struct Subscription {
    subject: String,
    inner: BoxStream<'static, BusMessage>,
}

impl Subscription {
    pub fn new(subject: impl Into<String>, inner: BoxStream<'static, BusMessage>) -> Self {
        Self {
            subject: subject.into(),
            inner,
        }
    }

    /// The subject this subscription listens on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Receive the next message, or `None` once the connection is gone.
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.inner.next().await
    }
}

impl Stream for Subscription {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
