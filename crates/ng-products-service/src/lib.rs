//! Northgate products responder.
//!
//! Owns the product catalog and answers the `products.*` subjects on the
//! bus: create, paginated listing, find-one and patch-style update.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod handler;
pub mod store;

pub use handler::ProductsHandler;
pub use store::{InMemoryProductStore, ProductStore};
