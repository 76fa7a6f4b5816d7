//! Northgate auth responder.
//!
//! Owns the user records and answers `auth.registerUser` and
//! `auth.loginUser` on the bus. Registration bcrypt-hashes the password
//! before storing; login verifies it and issues the JWT the gateway's guard
//! later checks. The responder itself is stateless about sessions: a token,
//! once granted, stands on its own signature until it expires.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod handler;
pub mod store;

pub use handler::AuthHandler;
pub use store::{InMemoryUserStore, StoreError, User, UserStore};
