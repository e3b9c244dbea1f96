use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::services::PhotoStore;
use crate::utils::AppResult;

/// Shared handle to everything a request handler needs.
///
/// Cheap to clone: the pool and photo store are shared-ownership handles.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable)
    pub config: Config,
    /// SQLite connection pool
    pub pool: SqlitePool,
    /// Uploaded photo storage
    pub photos: PhotoStore,
}

impl ServerState {
    /// Initialize server state in order:
    /// 1. work directory layout (database/, uploads/)
    /// 2. database (WAL pool + migrations)
    /// 3. photo store
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config.ensure_work_dir_structure()?;

        let db = DbService::new(&config.database_path().to_string_lossy()).await?;
        let photos = PhotoStore::new(config.uploads_dir());

        Ok(Self {
            config: config.clone(),
            pool: db.pool,
            photos,
        })
    }
}
