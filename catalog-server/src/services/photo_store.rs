//! Photo Store
//!
//! Owns the uploads directory: writes newly attached photos under generated
//! collision-free names and removes files that no longer back any product.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::utils::{AppError, AppResult};

/// Maximum accepted photo size (10 MiB)
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// URL prefix uploaded files are served under
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Uploaded photo storage
#[derive(Debug, Clone)]
pub struct PhotoStore {
    uploads_dir: PathBuf,
}

impl PhotoStore {
    /// `uploads_dir` is the directory photo files are stored in
    pub fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }

    /// Resolve a stored filename to its on-disk path
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.uploads_dir.join(filename)
    }

    /// Public URL for a stored filename
    pub fn url_of(&self, filename: &str) -> String {
        format!("{UPLOADS_PREFIX}/{filename}")
    }

    /// Persist photo bytes under a freshly generated name, preserving the
    /// original extension. Names are never reused, so a re-attached photo
    /// always gets a new URL.
    pub async fn save(&self, bytes: &[u8], original_name: Option<&str>) -> AppResult<String> {
        let ext = original_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let filename = match ext {
            Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
            _ => Uuid::new_v4().to_string(),
        };

        fs::create_dir_all(&self.uploads_dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create uploads directory: {e}")))?;
        fs::write(self.path_of(&filename), bytes)
            .await
            .map_err(|e| AppError::internal(format!("Failed to save photo: {e}")))?;

        Ok(filename)
    }

    /// Best-effort removal of the file behind a photo URL.
    ///
    /// Failure is logged, never surfaced: by the time this runs the
    /// association is already gone and an unreachable file must not block
    /// the mutation.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(filename) = url.rsplit('/').next() else {
            return;
        };
        if filename.is_empty() || filename.contains("..") {
            return;
        }

        match fs::remove_file(self.path_of(filename)).await {
            Ok(_) => tracing::debug!(file = %filename, "Photo file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %filename, error = %e, "Failed to remove photo file"),
        }
    }
}
