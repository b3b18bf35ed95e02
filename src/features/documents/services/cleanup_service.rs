use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::repositories::DocumentRepository;
use crate::features::documents::services::JobRegistry;
use crate::modules::storage::LocalFileStorage;

/// Removes the temporary upload of a document whose run is over.
///
/// Touches only the file on disk, never the record or the job entry.
pub struct CleanupService {
    documents: Arc<dyn DocumentRepository>,
    storage: Arc<LocalFileStorage>,
    registry: Arc<JobRegistry>,
}

impl CleanupService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        storage: Arc<LocalFileStorage>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            documents,
            storage,
            registry,
        }
    }

    pub async fn cleanup(&self, id: Uuid) -> Result<()> {
        let path = self.terminal_file_path(id).await?;

        if self.storage.delete(&path).await? {
            tracing::info!("Removed temporary file for document {}", id);
        } else {
            tracing::debug!("Temporary file for document {} already removed", id);
        }
        Ok(())
    }

    async fn terminal_file_path(&self, id: Uuid) -> Result<PathBuf> {
        if let Some(job) = self.registry.get(id).await {
            if !job.is_terminal() {
                return Err(AppError::Conflict(format!(
                    "Document {} is still {}",
                    id, job.status
                )));
            }
            return Ok(job.file_path);
        }

        let document = self
            .documents
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        if !document.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Document {} is still {}",
                id, document.status
            )));
        }
        Ok(PathBuf::from(document.file_path))
    }
}
