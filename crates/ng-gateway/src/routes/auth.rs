//! Registration and login.
//!
//! The auth responder answers these subjects with a status-tagged reply
//! rather than an error envelope; rejection is a domain outcome there, not
//! a transport failure. The mapping onto HTTP statuses happens here: a
//! rejected login is 401, a rejected registration is 409.

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use shared_types::{subjects, AuthReply, LoginRequest, RegisterRequest};
use tracing::info;

use crate::error::ApiError;
use crate::routes::{call, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let reply: AuthReply =
        call(&state, subjects::AUTH_REGISTER, serde_json::to_value(&body)?).await?;

    match reply {
        AuthReply::Accepted { message } => {
            info!(email = %body.email, "User registered");
            Ok((StatusCode::OK, Json(json!({ "message": message }))).into_response())
        }
        AuthReply::Rejected { message } => Err(ApiError::new(StatusCode::CONFLICT, message)),
        AuthReply::Granted { .. } => Err(ApiError::internal("unexpected registration reply")),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let reply: AuthReply = call(&state, subjects::AUTH_LOGIN, serde_json::to_value(&body)?).await?;

    match reply {
        AuthReply::Granted { token } => {
            info!(email = %body.email, "Login granted");
            let cookie = HeaderValue::from_str(&format!("cookie={token}; Path=/"))
                .map_err(|e| ApiError::internal(format!("cookie encoding failed: {e}")))?;

            let mut response =
                (StatusCode::OK, Json(json!({ "token": token }))).into_response();
            response.headers_mut().insert(header::SET_COOKIE, cookie);
            Ok(response)
        }
        AuthReply::Rejected { message } => Err(ApiError::unauthorized(message)),
        AuthReply::Accepted { .. } => Err(ApiError::internal("unexpected login reply")),
    }
}
