//! Bearer-token guard for the protected route tree.
//!
//! Verifies the `Authorization: Bearer` token on every request it wraps and
//! inserts the verified [`Identity`] as a request extension. Anything else
//! is answered with 401 and a `WWW-Authenticate: Bearer` challenge before
//! the inner service is reached.

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use shared_auth::{TokenError, TokenService};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::debug;

use crate::error::ApiError;

/// The verified caller, available to handlers via `Extension<Identity>`.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Token subject; the email the session was issued for.
    pub subject: String,
}

/// Layer that wraps a route tree in the bearer-token guard.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: Arc<TokenService>,
}

impl AuthLayer {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            tokens: Arc::clone(&self.tokens),
        }
    }
}

/// The guard service produced by [`AuthLayer`].
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    tokens: Arc<TokenService>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let tokens = Arc::clone(&self.tokens);
        // The future has to run on the instance poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let token = bearer_token(&req).map(str::to_owned);
            let Some(token) = token else {
                return Ok(unauthorized_response("missing bearer token"));
            };

            match tokens.verify(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(Identity {
                        subject: claims.sub,
                    });
                    inner.call(req).await
                }
                Err(error) => {
                    debug!(%error, "Rejected bearer token");
                    Ok(unauthorized_response(rejection_reason(&error)))
                }
            }
        })
    }
}

fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn rejection_reason(error: &TokenError) -> &'static str {
    match error {
        TokenError::Expired => "token expired",
        TokenError::InvalidSignature => "invalid token signature",
        _ => "invalid token",
    }
}

fn unauthorized_response(message: &str) -> Response {
    let mut response = ApiError::unauthorized(message).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer"),
    );
    response
}
