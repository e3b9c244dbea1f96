//! Photo attachment handlers
//!
//! A product owns at most one photo. Attach replaces the association under a
//! freshly generated filename; detach clears it. File removal is best-effort:
//! the association is cleared even when the underlying file cannot be
//! deleted, so the client is never stuck pointing at an unreachable image.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};

use crate::core::ServerState;
use crate::db::repository::product;
use crate::services::photo_store::MAX_PHOTO_BYTES;
use crate::utils::{AppError, AppResult};
use shared::models::Product;

/// Transport ceiling for the multipart body: the 10 MiB photo plus framing.
/// Oversized photos under this ceiling get the explicit 413 below.
pub(super) const PHOTO_BODY_LIMIT: usize = MAX_PHOTO_BYTES + 2 * 1024 * 1024;

/// POST /api/products/:id/photo - attach or replace the product photo
pub async fn attach(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<Product>> {
    let existing = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;

    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            file = Some((file_name, content_type, data.to_vec()));
            break;
        }
    }

    let (file_name, content_type, data) = file.ok_or_else(|| {
        AppError::validation("No 'file' field found. Field name must be 'file'")
    })?;

    let content_type = content_type.ok_or_else(|| {
        AppError::unsupported_media_type("Missing content type; only images are accepted")
    })?;
    if !content_type.starts_with("image/") {
        return Err(AppError::unsupported_media_type(format!(
            "'{content_type}' is not an image type"
        )));
    }
    if data.len() > MAX_PHOTO_BYTES {
        return Err(AppError::PayloadTooLarge);
    }
    if data.is_empty() {
        return Err(AppError::validation("Empty file provided"));
    }

    let filename = state.photos.save(&data, file_name.as_deref()).await?;
    let url = state.photos.url_of(&filename);
    let updated = product::set_photo(&state.pool, id, Some(url)).await?;

    // The replaced file no longer backs anything
    if let Some(old) = &existing.photo_url {
        state.photos.remove_by_url(old).await;
    }

    tracing::info!(id, file = %filename, size = data.len(), "Product photo attached");
    Ok(Json(updated))
}

/// DELETE /api/products/:id/photo - clear the photo association (idempotent)
pub async fn detach(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let existing = product::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;

    let Some(url) = &existing.photo_url else {
        // Nothing attached; returning the product unchanged keeps the call idempotent
        return Ok(Json(existing));
    };

    state.photos.remove_by_url(url).await;
    let updated = product::set_photo(&state.pool, id, None).await?;

    tracing::info!(id, "Product photo detached");
    Ok(Json(updated))
}
