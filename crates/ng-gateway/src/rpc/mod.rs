//! The request/reply bridge: pending-call table plus the bus-facing client.

pub mod client;
pub mod pending;

pub use client::{CallError, RpcClient};
pub use pending::{cleanup_task, PendingCallStore, PendingStats, PendingStatsSnapshot};
