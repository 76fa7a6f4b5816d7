//! Signed bearer tokens.
//!
//! HS256 JWTs carrying `{sub, iat, exp}`. A token is valid exactly when the
//! signature verifies against the current secret and `now < exp`; there is
//! no revocation list, expiry is purely by time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated identity (the account email).
    pub sub: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Why a token failed verification or issuance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token could not be issued: {0}")]
    Issue(String),
}

/// Issues and verifies bearer tokens. Pure function of the secret, the TTL
/// and the clock; safe to share behind an `Arc`.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let algorithm = Algorithm::HS256;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            header: Header::new(algorithm),
            // Default Validation already checks exp; pin the algorithm.
            validation: Validation::new(algorithm),
            ttl,
        }
    }

    /// Configured token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `identity`, valid from now until now + TTL.
    pub fn issue(&self, identity: &str) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Sign a token with an explicit issue instant. Lets callers pin the
    /// clock; expiry is still `issued_at + TTL`.
    pub fn issue_at(&self, identity: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: identity.to_string(),
            iat,
            exp: iat + self.ttl.as_secs() as i64,
        };
        encode(&self.header, &claims, &self.encoding).map_err(|e| TokenError::Issue(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}
