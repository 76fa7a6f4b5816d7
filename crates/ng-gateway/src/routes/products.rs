//! Product routes, bridged onto the products responder.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use shared_types::{
    subjects, NewProduct, PageRequest, PageResult, Product, ProductPatch, UpdateProductRequest,
};

use crate::error::ApiError;
use crate::routes::{call, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/findAll", get(find_all))
        .route("/products/create", post(create))
        .route("/products/:id", get(find_one).patch(update))
}

async fn find_all(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResult<Product>>, ApiError> {
    let result = call(
        &state,
        subjects::PRODUCTS_FIND_ALL,
        serde_json::to_value(page)?,
    )
    .await?;
    Ok(Json(result))
}

async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = call(
        &state,
        subjects::PRODUCTS_CREATE,
        serde_json::to_value(&body)?,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn find_one(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, ApiError> {
    // The find-one payload is the bare id, not an object.
    let product = call(&state, subjects::PRODUCTS_FIND_ONE, json!(id)).await?;
    Ok(Json(product))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    let request = UpdateProductRequest { id, patch };
    let product = call(
        &state,
        subjects::PRODUCTS_UPDATE,
        serde_json::to_value(&request)?,
    )
    .await?;
    Ok(Json(product))
}
