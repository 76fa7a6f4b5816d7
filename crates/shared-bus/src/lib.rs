//! # Shared Bus - Transport Between Gateway and Responders
//!
//! Everything here treats the bus as an asynchronous request/reply fabric:
//! the gateway publishes a request envelope to a subject with a reply-to
//! subject attached, and exactly one responder answers on that reply
//! subject.
//!
//! ## Request/Reply Flow
//!
//! ```text
//! ┌──────────────┐                        ┌──────────────┐
//! │   Gateway    │  publish(subject,      │  Responder   │
//! │  RPC client  │          reply_to)     │ serve() loop │
//! │              │ ──────────┐            │              │
//! └──────────────┘           │            └──────────────┘
//!        ↑                   ▼                    │
//!        │             ┌──────────────┐           │
//!        └──────────── │     Bus      │ ◄─────────┘
//!   subscribe(reply_to)│              │  publish(reply_to)
//!                      └──────────────┘
//! ```
//!
//! ## Implementations
//!
//! - [`InMemoryBus`]: in-process fan-out for single-node runs and tests;
//!   connections can be severed to simulate outages.
//! - [`NatsTransport`]: the deployment transport over `async-nats`.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod memory;
pub mod message;
pub mod nats;
pub mod responder;
pub mod transport;

// Re-export main types
pub use error::BusError;
pub use memory::{InMemoryBus, InMemoryConnection};
pub use message::BusMessage;
pub use nats::{NatsConnection, NatsTransport};
pub use responder::{serve, SubjectHandler};
pub use transport::{BusConnection, BusTransport, Subscription};

/// Maximum messages to buffer per subscription before drops.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
