//! Customer persistence.

use parking_lot::RwLock;
use shared_types::{Customer, CustomerPatch, NewCustomer, PageRequest, PageResult};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a customer with id {0} already exists")]
    DuplicateId(String),
}

/// Storage seam for the customers responder.
///
/// Ids are caller-chosen; listing is ordered by id.
pub trait CustomerStore: Send + Sync {
    /// Stores a new customer. The id must be unused.
    fn create(&self, new: NewCustomer) -> Result<Customer, StoreError>;

    fn list(&self, request: PageRequest) -> PageResult<Customer>;

    fn find(&self, id: &str) -> Option<Customer>;

    /// Applies the patch and returns the updated record, or `None` when the
    /// id is unknown.
    fn update(&self, id: &str, patch: &CustomerPatch) -> Option<Customer>;

    /// Removes and returns the record, or `None` when the id is unknown.
    fn remove(&self, id: &str) -> Option<Customer>;

    fn len(&self) -> usize;
}

/// Process-local customer store.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    customers: RwLock<BTreeMap<String, Customer>>,
}

impl InMemoryCustomerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with a handful of demo customers.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::new();
        for (id, contact, city, country) in [
            ("ALFKI", "Maria Anders", "Berlin", "Germany"),
            ("ANATR", "Ana Trujillo", "México D.F.", "Mexico"),
            ("ANTON", "Antonio Moreno", "México D.F.", "Mexico"),
            ("AROUT", "Thomas Hardy", "London", "UK"),
            ("BERGS", "Christina Berglund", "Luleå", "Sweden"),
        ] {
            // The seed ids are distinct, so this cannot collide.
            let _ = store.create(NewCustomer {
                customer_id: id.to_string(),
                contact_name: Some(contact.to_string()),
                city: Some(city.to_string()),
                country: Some(country.to_string()),
            });
        }
        store
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn create(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let mut customers = self.customers.write();
        if customers.contains_key(&new.customer_id) {
            return Err(StoreError::DuplicateId(new.customer_id));
        }
        let customer = Customer::from(new);
        customers.insert(customer.customer_id.clone(), customer.clone());
        Ok(customer)
    }

    fn list(&self, request: PageRequest) -> PageResult<Customer> {
        let request = request.normalized();
        let customers = self.customers.read();
        let data: Vec<Customer> = customers
            .values()
            .skip(request.offset())
            .take(request.limit as usize)
            .cloned()
            .collect();
        PageResult::new(data, customers.len() as u64, request)
    }

    fn find(&self, id: &str) -> Option<Customer> {
        self.customers.read().get(id).cloned()
    }

    fn update(&self, id: &str, patch: &CustomerPatch) -> Option<Customer> {
        let mut customers = self.customers.write();
        let customer = customers.get_mut(id)?;
        customer.apply(patch);
        Some(customer.clone())
    }

    fn remove(&self, id: &str) -> Option<Customer> {
        self.customers.write().remove(id)
    }

    fn len(&self) -> usize {
        self.customers.read().len()
    }
}
