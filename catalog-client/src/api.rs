//! Catalog API abstraction
//!
//! The cache synchronizer talks to the server through this trait, so tests
//! can drive it with an in-process fake.

use async_trait::async_trait;

use crate::error::ClientResult;
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::query::{PaginatedResponse, QuerySpec};

/// Network operations against the product catalog
#[async_trait]
pub trait ProductApi: Send + Sync {
    /// `GET /api/products` applying the query's filters, sort and page window
    async fn list(&self, spec: &QuerySpec) -> ClientResult<PaginatedResponse<Product>>;

    /// `GET /api/products/:id`
    async fn get(&self, id: i64) -> ClientResult<Product>;

    /// `POST /api/products`
    async fn create(&self, payload: &ProductCreate) -> ClientResult<Product>;

    /// `PUT /api/products/:id`
    async fn update(&self, id: i64, payload: &ProductUpdate) -> ClientResult<Product>;

    /// `DELETE /api/products/:id`
    async fn delete(&self, id: i64) -> ClientResult<()>;

    /// `POST /api/products/:id/photo` (multipart field `file`)
    async fn upload_photo(
        &self,
        id: i64,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Product>;

    /// `DELETE /api/products/:id/photo`
    async fn delete_photo(&self, id: i64) -> ClientResult<Product>;
}
