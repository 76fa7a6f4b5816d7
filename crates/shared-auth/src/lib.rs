//! # Shared Auth Crate
//!
//! Stateless credential primitives shared by the gateway and the auth
//! responder: signed time-limited bearer tokens and password hashing.
//!
//! Statelessness is the point: any gateway instance can verify any token
//! with nothing but the signing secret, so admission decisions never need a
//! session store or a round trip.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenService};
