//! # Shared Types Crate
//!
//! This crate contains the wire contract between the gateway and the backend
//! responders: correlation identifiers, the request/reply envelopes, subject
//! names, and the domain DTOs.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every shape that crosses the bus is defined
//!   here, once.
//! - **Subjects are the contract**: the gateway and a responder agree on
//!   nothing but a subject name and the envelope shapes in this crate.
//! - **No transport knowledge**: this crate performs no I/O; encoding is
//!   plain JSON via serde.

pub mod auth;
pub mod correlation;
pub mod customers;
pub mod envelope;
pub mod page;
pub mod products;
pub mod subjects;

pub use auth::{AuthReply, LoginRequest, RegisterRequest};
pub use correlation::CorrelationId;
pub use customers::{Customer, CustomerPatch, NewCustomer, UpdateCustomerRequest};
pub use envelope::{EnvelopeError, ErrorKind, ReplyEnvelope, ReplyError, RequestEnvelope};
pub use page::{PageRequest, PageResult};
pub use products::{NewProduct, Product, ProductPatch, UpdateProductRequest};
