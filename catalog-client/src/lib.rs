//! Catalog Client - HTTP client and cache synchronizer for the catalog server
//!
//! Provides network-based calls to the catalog API plus a page-keyed client
//! cache with in-flight fetch deduplication, optimistic delete and
//! invalidate/refetch reconciliation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use api::ProductApi;
pub use cache::{CacheSnapshot, CatalogCache, FetchStatus, MutationState, OptimisticDelete};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
