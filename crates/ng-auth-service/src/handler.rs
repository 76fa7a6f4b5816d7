//! Subject handler for `auth.registerUser` and `auth.loginUser`.
//!
//! Both operations answer with a status-tagged auth reply; a failed login or
//! duplicate registration is a domain outcome, not an error envelope. Error
//! envelopes are reserved for payloads that do not decode and for internal
//! failures (hashing, token issuing).
//!
//! Login answers with the same rejection message whether the email is
//! unknown or the password is wrong, so the surface cannot be used to probe
//! which addresses have accounts.

use async_trait::async_trait;
use serde_json::Value;
use shared_auth::{hash_password, verify_password, TokenService};
use shared_bus::responder::SubjectHandler;
use shared_types::{subjects, AuthReply, LoginRequest, RegisterRequest, ReplyError};
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::{StoreError, User, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid user email or password";

/// The auth responder.
pub struct AuthHandler {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
}

impl AuthHandler {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    fn register(&self, request: RegisterRequest) -> Result<AuthReply, ReplyError> {
        let password_hash = hash_password(&request.password)
            .map_err(|e| ReplyError::internal(format!("password hashing failed: {e}")))?;

        let user = User {
            username: request.username,
            email: request.email,
            password_hash,
        };

        match self.store.insert(user) {
            Ok(()) => {
                info!(users = self.store.len(), "User registered");
                Ok(AuthReply::accepted("Created the new user"))
            }
            Err(StoreError::DuplicateEmail(email)) => {
                warn!(%email, "Registration rejected, email taken");
                Ok(AuthReply::rejected(
                    "This user with the current email already exists!",
                ))
            }
        }
    }

    fn login(&self, request: LoginRequest) -> Result<AuthReply, ReplyError> {
        let Some(user) = self.store.find_by_email(&request.email) else {
            return Ok(AuthReply::rejected(INVALID_CREDENTIALS));
        };

        match verify_password(&request.password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => return Ok(AuthReply::rejected(INVALID_CREDENTIALS)),
            Err(e) => {
                return Err(ReplyError::internal(format!(
                    "password verification failed: {e}"
                )))
            }
        }

        let token = self
            .tokens
            .issue(&user.email)
            .map_err(|e| ReplyError::internal(format!("token issuing failed: {e}")))?;

        info!(email = %user.email, "Login granted");
        Ok(AuthReply::granted(token))
    }
}

#[async_trait]
impl SubjectHandler for AuthHandler {
    fn subjects(&self) -> &[&str] {
        &[subjects::AUTH_REGISTER, subjects::AUTH_LOGIN]
    }

    async fn handle(&self, subject: &str, data: Value) -> Result<Value, ReplyError> {
        let reply = match subject {
            subjects::AUTH_REGISTER => {
                let request: RegisterRequest = decode(data)?;
                self.register(request)?
            }
            subjects::AUTH_LOGIN => {
                let request: LoginRequest = decode(data)?;
                self.login(request)?
            }
            other => return Err(ReplyError::internal(format!("unroutable subject {other}"))),
        };

        serde_json::to_value(reply)
            .map_err(|e| ReplyError::internal(format!("reply encoding failed: {e}")))
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, ReplyError> {
    serde_json::from_value(data).map_err(|e| ReplyError::invalid(format!("bad payload: {e}")))
}
