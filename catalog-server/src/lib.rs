//! Catalog Server - product catalog HTTP backend
//!
//! # Module structure
//!
//! ```text
//! catalog-server/src/
//! ├── core/      # configuration, state, HTTP server, middleware
//! ├── api/       # HTTP routes and handlers
//! ├── db/        # SQLite store, query composition, repositories
//! ├── services/  # photo store
//! └── utils/     # errors, logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export common types
pub use crate::core::{Config, Server, ServerState, build_app};
pub use crate::utils::logger::init_logger;
pub use crate::utils::{AppError, AppResult};
