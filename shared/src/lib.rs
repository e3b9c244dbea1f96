//! Shared types for the catalog server and client
//!
//! Common types used across both crates: domain models, the list query
//! parameter model and pagination envelope, and id/time utilities.

pub mod models;
pub mod query;
pub mod util;

// Re-export common types
pub use models::{Product, ProductCreate, ProductUpdate};
pub use query::{
    ListParams, PageMode, PaginatedResponse, QuerySpec, SortField, SortOrder, MAX_LIMIT,
};
