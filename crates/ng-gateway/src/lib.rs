//! Northgate gateway: the HTTP edge of the system.
//!
//! Translates REST-ish HTTP requests into correlated request/reply calls on
//! the message bus and maps the outcomes back onto statuses and JSON bodies.
//!
//! ```text
//!  HTTP client
//!      │ Bearer token (issued at login)
//!      ▼
//!  axum router ── auth guard ── handler
//!      │                          │ subject + JSON payload
//!      ▼                          ▼
//!            RpcClient ── pending-call table (correlation ids)
//!                │
//!                ▼
//!            message bus ──► responder crates (auth/products/customers)
//! ```
//!
//! A call either resolves with the responder's reply, fails with the
//! responder's distinguished error, or times out; the bus being down maps to
//! 502 and a silent responder to 504.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod rpc;
pub mod service;

pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use middleware::{AuthLayer, Identity};
pub use routes::AppState;
pub use rpc::{CallError, RpcClient};
pub use service::{GatewayError, GatewayService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
