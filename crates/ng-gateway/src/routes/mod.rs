//! HTTP surface of the gateway.
//!
//! Handlers are thin: decode the HTTP request, issue one bus call, map the
//! reply onto a status and JSON body. Everything stateful lives in
//! [`AppState`]. The products and customers trees sit behind the bearer
//! guard; health and the auth routes are public.

use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared_auth::TokenService;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::middleware::AuthLayer;
use crate::rpc::RpcClient;

pub mod auth;
pub mod customers;
pub mod products;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub rpc: Arc<RpcClient>,
    pub tokens: Arc<TokenService>,
}

/// Builds the complete gateway router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(products::router())
        .merge(customers::router())
        .route_layer(AuthLayer::new(Arc::clone(&state.tokens)));

    Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Issues one bus call and decodes the success payload into `T`.
pub(crate) async fn call<T: DeserializeOwned>(
    state: &AppState,
    subject: &str,
    payload: Value,
) -> Result<T, ApiError> {
    let reply = state.rpc.call(subject, payload, None).await?;
    serde_json::from_value(reply)
        .map_err(|e| ApiError::internal(format!("malformed reply from {subject}: {e}")))
}
