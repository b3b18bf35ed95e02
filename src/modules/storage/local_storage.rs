//! Local filesystem storage for uploaded documents
//!
//! Uploads land in `<root>/temp/` until their processing run is terminal;
//! `<root>/processed/` is reserved for artifacts kept after processing.

use lazy_static::lazy_static;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::Result;

lazy_static! {
    static ref UNSAFE_FILE_CHARS_RE: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    UNSAFE_FILE_CHARS_RE.replace_all(name, "_").to_string()
}

/// Extension of `file_name` including the dot, sanitized (`".pdf"`), or empty
fn sanitized_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", sanitize_file_name(ext)))
        .unwrap_or_default()
}

pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    /// Create the upload root and its `temp/` and `processed/` subdirectories
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.temp_dir()).await?;
        tokio::fs::create_dir_all(self.processed_dir()).await?;
        info!("Upload directories ready under {}", self.root.display());
        Ok(())
    }

    /// Durably write `data` as `temp/<document_id><ext>` and return the path
    pub async fn store(
        &self,
        document_id: Uuid,
        original_file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf> {
        let dir = self.temp_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!(
            "{}{}",
            document_id,
            sanitized_extension(original_file_name)
        ));

        let mut file = tokio::fs::File::create(&path).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, data).await?;
        file.sync_all().await?;

        debug!("Stored upload {} ({} bytes)", path.display(), data.len());
        Ok(path)
    }

    /// Remove a stored file. Returns `false` when it was already gone.
    pub async fn delete(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted stored file {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
