//! Tower middleware applied to the HTTP surface.

pub mod auth;

pub use auth::{AuthLayer, Identity};
