//! The unit of transport: a payload addressed to a subject.

use bytes::Bytes;

/// A message as it travels on the bus.
///
/// `reply_to` carries the subject the receiver should answer on; requests
/// set it, replies and fire-and-forget messages leave it empty. The payload
/// is opaque to the transport (JSON-encoded envelopes everywhere in this
/// system, but the bus does not care).
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub subject: String,
    pub reply_to: Option<String>,
    pub payload: Bytes,
}

impl BusMessage {
    /// A message with no reply subject.
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            reply_to: None,
            payload: payload.into(),
        }
    }

    /// A request expecting its answer on `reply_to`.
    pub fn with_reply(
        subject: impl Into<String>,
        reply_to: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            subject: subject.into(),
            reply_to: Some(reply_to.into()),
            payload: payload.into(),
        }
    }
}
