//! Request and reply envelopes carried on the message bus.
//!
//! A request is published to its subject as a [`RequestEnvelope`]; the
//! responder publishes exactly one [`ReplyEnvelope`] to the request's
//! reply-to subject. The correlation identifier inside the envelope is what
//! routes a reply back to the caller that issued it, since one reply subject
//! is shared by every outstanding call of a client.
//!
//! Exactly one of `response` / `err` is present on a reply. A populated
//! `err` means the responder understood the request and rejected it (or
//! failed internally); transport-level failures never produce an envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::correlation::CorrelationId;

/// One RPC request, as published to its subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation identifier; echoed back verbatim in the reply.
    pub id: CorrelationId,
    /// Operation payload. Shape is subject-specific.
    pub data: Value,
}

impl RequestEnvelope {
    /// Build an envelope with a freshly generated correlation identifier.
    pub fn new(data: Value) -> Self {
        Self {
            id: CorrelationId::new(),
            data,
        }
    }

    /// Build an envelope around an identifier the caller already registered.
    pub fn with_id(id: CorrelationId, data: Value) -> Self {
        Self { id, data }
    }

    /// Serialize to the JSON bytes that go on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(EnvelopeError::Encode)
    }

    /// Deserialize from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)
    }
}

/// One RPC reply, as published to the caller's reply-to subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// Correlation identifier of the request this answers.
    pub id: CorrelationId,
    /// Success payload. Absent when `err` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Responder-reported failure. Absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<ReplyError>,
}

impl ReplyEnvelope {
    /// Successful reply carrying `response`.
    pub fn ok(id: CorrelationId, response: Value) -> Self {
        Self {
            id,
            response: Some(response),
            err: None,
        }
    }

    /// Failure reply carrying a responder-reported error.
    pub fn err(id: CorrelationId, err: ReplyError) -> Self {
        Self {
            id,
            response: None,
            err: Some(err),
        }
    }

    /// Collapse into a result. An envelope with both fields set resolves to
    /// the error; one with neither resolves to `Null`.
    pub fn into_result(self) -> Result<Value, ReplyError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.response.unwrap_or(Value::Null)),
        }
    }

    /// Serialize to the JSON bytes that go on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(EnvelopeError::Encode)
    }

    /// Deserialize from wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(bytes).map_err(EnvelopeError::Decode)
    }
}

/// Failure a responder reports instead of a success payload.
///
/// The gateway maps `kind` to an HTTP status and passes `message` through to
/// the client verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct ReplyError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ReplyError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Conflict,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Invalid,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }
}

/// Coarse classification of a responder-reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed record does not exist.
    NotFound,
    /// The request collides with existing state (duplicate key).
    Conflict,
    /// The request payload does not decode or fails a domain rule.
    Invalid,
    /// The responder failed internally but still replied.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Envelope (de)serialization failure.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope does not encode: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("envelope does not decode: {0}")]
    Decode(#[source] serde_json::Error),
}
