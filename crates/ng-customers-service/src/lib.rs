//! Northgate customers responder.
//!
//! Owns the customer records and answers the `customers.*` subjects on the
//! bus: paginated listing, find-one, create (ids are caller-chosen short
//! codes), patch-style update, and delete returning the removed record.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod handler;
pub mod store;

pub use handler::CustomersHandler;
pub use store::{CustomerStore, InMemoryCustomerStore, StoreError};
