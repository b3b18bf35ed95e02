use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::SubmitDocumentDto;
use crate::features::documents::models::{CreateCompanyDocument, JobStatus};
use crate::features::documents::repositories::DocumentRepository;
use crate::features::documents::services::JobRegistry;
use crate::modules::storage::{sanitize_file_name, LocalFileStorage};

/// Accepts uploaded documents: stores the bytes, creates the pending record
/// and registers the job
pub struct IntakeService {
    documents: Arc<dyn DocumentRepository>,
    storage: Arc<LocalFileStorage>,
    registry: Arc<JobRegistry>,
}

impl IntakeService {
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

    pub async fn submit(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
        owner_id: &str,
    ) -> Result<Uuid> {
        let dto = SubmitDocumentDto {
            data,
            file_name,
            mime_type,
            owner_id,
        };
        dto.validate()?;

        let id = Uuid::new_v4();
        let path = self
            .storage
            .store(id, file_name, data)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store upload for document {}: {}", id, e);
                AppError::Validation(format!("Failed to store document: {}", e))
            })?;

        let record = CreateCompanyDocument {
            id,
            owner_id: owner_id.to_string(),
            file_name: sanitize_file_name(file_name),
            file_type: mime_type.to_string(),
            file_path: path.to_string_lossy().into_owned(),
            file_size: data.len() as i64,
        };

        let document = match self.documents.create(&record).await {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup_err) = self.storage.delete(&path).await {
                    tracing::warn!(
                        "Failed to remove orphaned upload {}: {}",
                        path.display(),
                        cleanup_err
                    );
                }
                return Err(e);
            }
        };

        self.registry.register(JobStatus::from_document(&document)).await;

        tracing::info!(
            "Accepted document {} ({}, {} bytes) for owner {}",
            id,
            document.file_name,
            document.file_size,
            owner_id
        );
        Ok(id)
    }
}
