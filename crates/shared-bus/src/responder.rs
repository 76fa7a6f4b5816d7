//! Responder side of the request/reply contract.
//!
//! A responder subscribes to a fixed set of subjects and answers every
//! decodable request it receives with exactly one reply envelope, error
//! payloads included. Conditions the responder can detect (bad payload,
//! missing record, internal failure) must surface as error replies rather
//! than silence, because silence costs the caller a full timeout.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::select_all;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use shared_types::{ReplyEnvelope, ReplyError, RequestEnvelope};

use crate::error::BusError;
use crate::message::BusMessage;
use crate::transport::BusConnection;

/// Domain logic behind one responder process.
#[async_trait]
pub trait SubjectHandler: Send + Sync {
    /// Subjects this responder answers on.
    fn subjects(&self) -> &[&str];

    /// Handle one request payload. The returned value (or error) becomes the
    /// reply envelope; implementations decode `data` themselves and report
    /// undecodable payloads as [`ReplyError::invalid`].
    async fn handle(&self, subject: &str, data: Value) -> Result<Value, ReplyError>;
}

/// Subscribe to every subject of `handler` and answer requests until the
/// connection closes.
pub async fn serve(
    conn: Arc<dyn BusConnection>,
    handler: Arc<dyn SubjectHandler>,
) -> Result<(), BusError> {
    let mut subscriptions = Vec::with_capacity(handler.subjects().len());
    for subject in handler.subjects() {
        subscriptions.push(conn.subscribe(subject).await?);
    }
    info!(subjects = ?handler.subjects(), "Responder serving");

    let mut requests = select_all(subscriptions);
    while let Some(message) = requests.next().await {
        dispatch(conn.as_ref(), handler.as_ref(), message).await;
    }

    info!(subjects = ?handler.subjects(), "Responder stream ended");
    Ok(())
}

#[instrument(skip_all, fields(subject = %message.subject))]
async fn dispatch(conn: &dyn BusConnection, handler: &dyn SubjectHandler, message: BusMessage) {
    let Some(reply_to) = message.reply_to else {
        warn!("Request without reply subject dropped");
        return;
    };

    let request = match RequestEnvelope::from_bytes(&message.payload) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Undecodable request dropped");
            return;
        }
    };

    let id = request.id;
    debug!(correlation_id = %id, "Request received");

    let reply = match handler.handle(&message.subject, request.data).await {
        Ok(response) => ReplyEnvelope::ok(id, response),
        Err(err) => {
            debug!(correlation_id = %id, error = %err, "Replying with error");
            ReplyEnvelope::err(id, err)
        }
    };

    let bytes = match reply.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(correlation_id = %id, error = %e, "Reply payload does not encode");
            match ReplyEnvelope::err(id, ReplyError::internal("reply serialization failed"))
                .to_bytes()
            {
                Ok(bytes) => bytes,
                Err(_) => return,
            }
        }
    };

    if let Err(e) = conn.publish(BusMessage::new(reply_to, bytes)).await {
        warn!(correlation_id = %id, error = %e, "Reply publish failed");
    }
}
