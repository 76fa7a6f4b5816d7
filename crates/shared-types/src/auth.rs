//! Auth exchange DTOs.

use serde::{Deserialize, Serialize};

/// Payload for `auth.registerUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Payload for `auth.loginUser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Outcome of a login or register exchange.
///
/// The discriminator (`status` on the wire) decides which field is
/// meaningful: a successful login carries a token, everything else carries a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthReply {
    /// Credentials accepted; `token` is the bearer token to present.
    Granted { token: String },
    /// Registration completed.
    Accepted { message: String },
    /// Credentials or business rule rejected the request.
    Rejected { message: String },
}

impl AuthReply {
    pub fn granted(token: impl Into<String>) -> Self {
        Self::Granted {
            token: token.into(),
        }
    }

    pub fn accepted(message: impl Into<String>) -> Self {
        Self::Accepted {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}
