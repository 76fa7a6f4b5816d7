//! Subject handler for the `products.*` operations.

use async_trait::async_trait;
use serde_json::Value;
use shared_bus::responder::SubjectHandler;
use shared_types::{
    subjects, NewProduct, PageRequest, ReplyError, UpdateProductRequest,
};
use std::sync::Arc;
use tracing::info;

use crate::store::ProductStore;

/// The products responder.
pub struct ProductsHandler {
    store: Arc<dyn ProductStore>,
}

impl ProductsHandler {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SubjectHandler for ProductsHandler {
    fn subjects(&self) -> &[&str] {
        &[
            subjects::PRODUCTS_CREATE,
            subjects::PRODUCTS_FIND_ALL,
            subjects::PRODUCTS_FIND_ONE,
            subjects::PRODUCTS_UPDATE,
        ]
    }

    async fn handle(&self, subject: &str, data: Value) -> Result<Value, ReplyError> {
        match subject {
            subjects::PRODUCTS_CREATE => {
                let new: NewProduct = decode(data)?;
                let product = self.store.create(new);
                info!(product_id = product.product_id, "Product created");
                encode(product)
            }
            subjects::PRODUCTS_FIND_ALL => {
                let request: PageRequest = decode(data)?;
                encode(self.store.list(request))
            }
            subjects::PRODUCTS_FIND_ONE => {
                // The payload is the bare id.
                let id: u64 = decode(data)?;
                let product = self
                    .store
                    .find(id)
                    .ok_or_else(|| ReplyError::not_found(format!("no product with id {id}")))?;
                encode(product)
            }
            subjects::PRODUCTS_UPDATE => {
                let request: UpdateProductRequest = decode(data)?;
                let product = self.store.update(request.id, &request.patch).ok_or_else(|| {
                    ReplyError::not_found(format!("no product with id {}", request.id))
                })?;
                info!(product_id = product.product_id, "Product updated");
                encode(product)
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
