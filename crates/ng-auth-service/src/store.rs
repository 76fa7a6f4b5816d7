//! User persistence.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// A stored user. The password never leaves the store in the clear; only
/// its bcrypt hash is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),
}

/// Storage seam for the auth responder. Email is the lookup key.
pub trait UserStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// Inserts a new user. Duplicate emails are rejected atomically; there
    /// is no separate exists-check for callers to race against.
    fn insert(&self, user: User) -> Result<(), StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.read().get(email).cloned()
    }

    fn insert(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write();
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    fn len(&self) -> usize {
        self.users.read().len()
    }
}
