use std::path::PathBuf;

use crate::utils::{AppError, AppResult};

/// Server configuration
///
/// All values can be overridden through environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (database, uploads) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | LOG_LEVEL | info | tracing level filter |
/// | LOG_DIR | unset | Daily-rolling log file directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/var/lib/catalog HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and uploaded files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// tracing level filter
    pub log_level: String,
    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Override the work directory and port, keeping everything else from the
    /// environment. Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Directory holding the SQLite database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("catalog.db")
    }

    /// Directory uploaded photos are stored in
    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    /// Create the work directory layout if it does not exist yet
    pub fn ensure_work_dir_structure(&self) -> AppResult<()> {
        for dir in [self.database_dir(), self.uploads_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::internal(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
