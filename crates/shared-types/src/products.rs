//! Product DTOs. Field names match the wire contract (snake_case columns of
//! the backing store).

use serde::{Deserialize, Serialize};

/// A product record as stored and returned by the products responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: u64,
    pub product_name: String,
    pub unit_price: f64,
    pub units_in_stock: i32,
}

/// Payload for `products.createProduct`; the responder assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub unit_price: f64,
    pub units_in_stock: i32,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub unit_price: Option<f64>,
    pub units_in_stock: Option<i32>,
}

impl ProductPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none() && self.unit_price.is_none() && self.units_in_stock.is_none()
    }
}

/// Payload for `products.updateProduct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub id: u64,
    pub patch: ProductPatch,
}

impl Product {
    /// Apply a patch in place.
    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.product_name {
            self.product_name = name.clone();
        }
        if let Some(price) = patch.unit_price {
            self.unit_price = price;
        }
        if let Some(stock) = patch.units_in_stock {
            self.units_in_stock = stock;
        }
    }
}
