//! Correlation table for in-flight bus calls.
//!
//! Every outbound request registers a one-shot reply slot keyed by its
//! correlation id. The reply listener completes the slot when the matching
//! reply arrives; the caller cancels it on timeout. Resolution is
//! remove-then-send, so each call resolves at most once no matter how the
//! race between reply, timeout and sweep plays out.

use shared_types::{CorrelationId, ReplyEnvelope};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// One in-flight call waiting for its reply.
struct PendingCall {
    reply_tx: oneshot::Sender<ReplyEnvelope>,
    created_at: Instant,
    subject: String,
    timeout: Duration,
}

/// Lifecycle counters for the pending table.
#[derive(Debug, Default)]
pub struct PendingStats {
    registered: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    expired: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub expired: u64,
}

impl PendingStats {
    fn snapshot(&self) -> PendingStatsSnapshot {
        PendingStatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Concurrent table of calls awaiting replies.
pub struct PendingCallStore {
    calls: dashmap::DashMap<CorrelationId, PendingCall>,
    stats: PendingStats,
    default_timeout: Duration,
}

impl PendingCallStore {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            calls: dashmap::DashMap::new(),
            stats: PendingStats::default(),
            default_timeout,
        }
    }

    /// Registers a new call and returns its id plus the receiver the caller
    /// awaits the reply on. `timeout` falls back to the store default and is
    /// only used by the sweep; the caller enforces its own deadline.
    pub fn register(
        &self,
        subject: &str,
        timeout: Option<Duration>,
    ) -> (CorrelationId, oneshot::Receiver<ReplyEnvelope>) {
        let id = CorrelationId::new();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.calls.insert(
            id,
            PendingCall {
                reply_tx,
                created_at: Instant::now(),
                subject: subject.to_string(),
                timeout: timeout.unwrap_or(self.default_timeout),
            },
        );
        self.stats.registered.fetch_add(1, Ordering::Relaxed);

        (id, reply_rx)
    }

    /// Resolves the call with `reply`. Returns false when the id is unknown,
    /// which covers both late replies after a timeout and duplicate replies
    /// after a first resolution.
    pub fn complete(&self, id: &CorrelationId, reply: ReplyEnvelope) -> bool {
        match self.calls.remove(id) {
            Some((_, call)) => {
                if call.reply_tx.send(reply).is_ok() {
                    self.stats.completed.fetch_add(1, Ordering::Relaxed);
                    true
                } else {
                    // Caller dropped the receiver between remove and send.
                    debug!(%id, subject = %call.subject, "Reply arrived for an abandoned call");
                    false
                }
            }
            None => false,
        }
    }

    /// Drops the call without resolving it. The caller invokes this on its
    /// own timeout so the table does not leak; the dropped sender surfaces
    /// as a closed channel to anyone still listening.
    pub fn cancel(&self, id: &CorrelationId) -> bool {
        if self.calls.remove(id).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Evicts every call whose deadline has passed. Returns how many were
    /// removed. Normally callers cancel themselves first; this is the
    /// backstop for callers that vanished without cancelling.
    pub fn remove_expired(&self) -> usize {
        let mut removed = 0usize;
        self.calls.retain(|id, call| {
            if call.created_at.elapsed() >= call.timeout {
                debug!(%id, subject = %call.subject, "Evicting expired pending call");
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            self.stats.expired.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.calls.contains_key(id)
    }

    #[must_use]
    pub fn stats(&self) -> PendingStatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for PendingCallStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCallStore")
            .field("pending", &self.calls.len())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

/// Spawns the periodic sweep that evicts expired entries.
pub fn cleanup_task(store: Arc<PendingCallStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let removed = store.remove_expired();
            if removed > 0 {
                debug!(
                    removed,
                    pending = store.pending_count(),
                    "Swept expired pending calls"
                );
            }
        }
    })
}
