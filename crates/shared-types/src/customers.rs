//! Customer DTOs. Customer ids are caller-chosen short codes (the classic
//! four-letter kind), not assigned by the responder.

use serde::{Deserialize, Serialize};

/// A customer record as stored and returned by the customers responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Payload for `customers.createCustomer`; the id comes from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub customer_id: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<NewCustomer> for Customer {
    fn from(new: NewCustomer) -> Self {
        Self {
            customer_id: new.customer_id,
            contact_name: new.contact_name,
            city: new.city,
            country: new.country,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerPatch {
    pub contact_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl CustomerPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.contact_name.is_none() && self.city.is_none() && self.country.is_none()
    }
}

/// Payload for `customers.updateCustomer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCustomerRequest {
    pub id: String,
    pub patch: CustomerPatch,
}

impl Customer {
    /// Apply a patch in place. The id never changes.
    pub fn apply(&mut self, patch: &CustomerPatch) {
        if let Some(contact) = &patch.contact_name {
            self.contact_name = Some(contact.clone());
        }
        if let Some(city) = &patch.city {
            self.city = Some(city.clone());
        }
        if let Some(country) = &patch.country {
            self.country = Some(country.clone());
        }
    }
}
