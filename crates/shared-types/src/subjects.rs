//! Subject names shared by the gateway and the backend responders.
//!
//! Subjects are the sole contract between the two sides: both must agree on
//! these names out of band, and versioning a subject is the only safe way to
//! change its payload shape. Names follow the `domain.action` convention.

/// Log a user in; payload [`crate::LoginRequest`], reply [`crate::AuthReply`].
pub const AUTH_LOGIN: &str = "auth.loginUser";
/// Register a user; payload [`crate::RegisterRequest`], reply [`crate::AuthReply`].
pub const AUTH_REGISTER: &str = "auth.registerUser";

/// Create a product; payload [`crate::NewProduct`], reply [`crate::Product`].
pub const PRODUCTS_CREATE: &str = "products.createProduct";
/// List products; payload [`crate::PageRequest`], reply a [`crate::PageResult`].
pub const PRODUCTS_FIND_ALL: &str = "products.findAllProducts";
/// Fetch one product; payload is the bare numeric id.
pub const PRODUCTS_FIND_ONE: &str = "products.findOneProduct";
/// Patch a product; payload [`crate::UpdateProductRequest`].
pub const PRODUCTS_UPDATE: &str = "products.updateProduct";

/// List customers; payload [`crate::PageRequest`], reply a [`crate::PageResult`].
pub const CUSTOMERS_FIND_ALL: &str = "customers.findCustomers";
/// Fetch one customer; payload is the bare id string.
pub const CUSTOMERS_FIND_ONE: &str = "customers.findCustomer";
/// Create a customer; payload [`crate::NewCustomer`], reply [`crate::Customer`].
pub const CUSTOMERS_CREATE: &str = "customers.createCustomer";
/// Patch a customer; payload [`crate::UpdateCustomerRequest`].
pub const CUSTOMERS_UPDATE: &str = "customers.updateCustomer";
/// Delete a customer; payload is the bare id string, reply the removed record.
pub const CUSTOMERS_DELETE: &str = "customers.deleteCustomer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects_are_domain_dot_action() {
        for subject in [
            AUTH_LOGIN,
            AUTH_REGISTER,
            PRODUCTS_CREATE,
            PRODUCTS_FIND_ALL,
            PRODUCTS_FIND_ONE,
            PRODUCTS_UPDATE,
            CUSTOMERS_FIND_ALL,
            CUSTOMERS_FIND_ONE,
            CUSTOMERS_CREATE,
            CUSTOMERS_UPDATE,
            CUSTOMERS_DELETE,
        ] {
            let parts: Vec<_> = subject.split('.').collect();
            assert_eq!(parts.len(), 2, "{subject} is not domain.action");
            assert!(!parts[0].is_empty() && !parts[1].is_empty());
        }
    }
}
