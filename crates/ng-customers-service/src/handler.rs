//! Subject handler for the `customers.*` operations.
//!
//! Delete answers with the removed record, matching the update/create shape.

use async_trait::async_trait;
use serde_json::Value;
use shared_bus::responder::SubjectHandler;
use shared_types::{subjects, NewCustomer, PageRequest, ReplyError, UpdateCustomerRequest};
use std::sync::Arc;
use tracing::info;

use crate::store::{CustomerStore, StoreError};

/// The customers responder.
pub struct CustomersHandler {
    store: Arc<dyn CustomerStore>,
}

impl CustomersHandler {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubjectHandler for CustomersHandler {
    fn subjects(&self) -> &[&str] {
        &[
            subjects::CUSTOMERS_FIND_ALL,
            subjects::CUSTOMERS_FIND_ONE,
            subjects::CUSTOMERS_CREATE,
            subjects::CUSTOMERS_UPDATE,
            subjects::CUSTOMERS_DELETE,
        ]
    }

    async fn handle(&self, subject: &str, data: Value) -> Result<Value, ReplyError> {
        match subject {
            subjects::CUSTOMERS_FIND_ALL => {
                let request: PageRequest = decode(data)?;
                encode(self.store.list(request))
            }
            subjects::CUSTOMERS_FIND_ONE => {
                // The payload is the bare id string.
                let id: String = decode(data)?;
                let customer = self
                    .store
                    .find(&id)
                    .ok_or_else(|| ReplyError::not_found(format!("no customer with id {id}")))?;
                encode(customer)
            }
            subjects::CUSTOMERS_CREATE => {
                let new: NewCustomer = decode(data)?;
                match self.store.create(new) {
                    Ok(customer) => {
                        info!(customer_id = %customer.customer_id, "Customer created");
                        encode(customer)
                    }
                    Err(StoreError::DuplicateId(id)) => Err(ReplyError::conflict(format!(
                        "a customer with id {id} already exists"
                    ))),
                }
            }
            subjects::CUSTOMERS_UPDATE => {
                let request: UpdateCustomerRequest = decode(data)?;
                let customer = self.store.update(&request.id, &request.patch).ok_or_else(|| {
                    ReplyError::not_found(format!("no customer with id {}", request.id))
                })?;
                info!(customer_id = %customer.customer_id, "Customer updated");
                encode(customer)
            }
            subjects::CUSTOMERS_DELETE => {
                let id: String = decode(data)?;
                let customer = self
                    .store
                    .remove(&id)
                    .ok_or_else(|| ReplyError::not_found(format!("no customer with id {id}")))?;
                info!(customer_id = %customer.customer_id, "Customer deleted");
                encode(customer)
            }
            other => Err(ReplyError::internal(format!("unroutable subject {other}"))),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ReplyError> {
    serde_json::from_value(data).map_err(|e| ReplyError::invalid(format!("bad payload: {e}")))
}

fn encode<T: serde::Serialize>(value: T) -> Result<Value, ReplyError> {
    serde_json::to_value(value)
        .map_err(|e| ReplyError::internal(format!("reply encoding failed: {e}")))
}
