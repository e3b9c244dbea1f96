//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// Timestamps are Unix milliseconds. The wire format is camelCase to match
/// the public API (`discountedPrice`, `photoUrl`, `createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Promotional price. Not required to be below `price`.
    pub discounted_price: Option<f64>,
    /// Unique across all products
    pub sku: String,
    /// `/uploads/<filename>` or an external URL
    pub photo_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub discounted_price: Option<f64>,
    pub sku: String,
    pub photo_url: Option<String>,
}

/// Update product payload (partial; absent fields keep their value)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub sku: Option<String>,
    pub photo_url: Option<String>,
}
