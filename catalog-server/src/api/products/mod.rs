//! Product API module

mod handler;
mod photo;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/{id}/photo",
            post(photo::attach)
                .delete(photo::detach)
                // Above axum's default so the explicit 10 MiB ceiling answers
                .layer(DefaultBodyLimit::max(photo::PHOTO_BODY_LIMIT)),
        )
}
