//! Transport-level failures.

use thiserror::Error;

/// Errors surfaced by bus transports and connections.
///
/// These are transport failures only; a responder that answers with a domain
/// error still counts as a successful exchange at this layer.
#[derive(Debug, Error)]
pub enum BusError {
    /// The connection was closed (locally or by the server).
    #[error("bus connection is closed")]
    Closed,

    /// Establishing a connection failed.
    #[error("bus connect failed: {0}")]
    Connect(String),

    /// A publish was not accepted by the transport.
    #[error("bus publish failed: {0}")]
    Publish(String),

    /// A subscription could not be created.
    #[error("bus subscribe failed: {0}")]
    Subscribe(String),
}
