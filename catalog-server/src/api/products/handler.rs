//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::core::ServerState;
use crate::db::repository::product;
use crate::utils::{AppError, AppResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::query::{ListParams, PageMode, PaginatedResponse, QuerySpec};

/// GET /api/products - paginated/filterable/sortable listing
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let spec = QuerySpec::normalize(&params, PageMode::Paged);
    let (data, total) = product::search(&state.pool, &spec).await?;
    Ok(Json(PaginatedResponse::new(data, total, spec.page, spec.limit)))
}

/// GET /api/products/:id - fetch a single product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let found = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(found))
}

/// POST /api/products - create a product
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let created = product::create(&state.pool, payload).await?;
    tracing::info!(id = created.id, sku = %created.sku, "Product created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/products/:id - partial update
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let updated = product::update(&state.pool, id, payload).await?;
    tracing::info!(id, "Product updated");
    Ok(Json(updated))
}

/// DELETE /api/products/:id - hard delete, plus best-effort photo cleanup
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let removed = product::delete(&state.pool, id).await?;
    if let Some(url) = &removed.photo_url {
        state.photos.remove_by_url(url).await;
    }
    tracing::info!(id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
