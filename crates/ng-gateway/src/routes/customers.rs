//! Customer routes, bridged onto the customers responder.
//!
//! The update and delete routes keep their verb-in-path shape
//! (`/customers/update/:id`, `/customers/delete/:id`); clients depend on it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::json;
use shared_types::{
    subjects, Customer, CustomerPatch, NewCustomer, PageRequest, PageResult,
    UpdateCustomerRequest,
};

use crate::error::ApiError;
use crate::routes::{call, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers/findAll", get(find_all))
        .route("/customers/create", post(create))
        .route("/customers/:id", get(find_one))
        .route("/customers/update/:id", patch(update))
        .route("/customers/delete/:id", delete(remove))
}

async fn find_all(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<Customer>>, ApiError> {
    let result = call(
        &state,
        subjects::CUSTOMERS_FIND_ALL,
        serde_json::to_value(page)?,
    )
    .await?;
    Ok(Json(result))
}

async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = call(
        &state,
        subjects::CUSTOMERS_CREATE,
        serde_json::to_value(&body)?,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn find_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    // The find-one payload is the bare id string.
    let customer = call(&state, subjects::CUSTOMERS_FIND_ONE, json!(id)).await?;
    Ok(Json(customer))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>, ApiError> {
    let request = UpdateCustomerRequest { id, patch };
    let customer = call(
        &state,
        subjects::CUSTOMERS_UPDATE,
        serde_json::to_value(&request)?,
    )
    .await?;
    Ok(Json(customer))
}

/// Returns the removed record, mirroring the other write routes.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let customer = call(&state, subjects::CUSTOMERS_DELETE, json!(id)).await?;
    Ok(Json(customer))
}
