use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::company_profiles::models::UserProfile;
use crate::features::company_profiles::services::{ExtractionOutcome, ExtractionService, ProfileMerger};
use crate::features::documents::clients::OcrUpload;
use crate::features::documents::models::{CompanyDocument, DocumentStatus, JobStatus};
use crate::features::documents::repositories::DocumentRepository;
use crate::features::documents::services::{
    CleanupService, IntakeService, JobRegistry, OcrFailure, OcrOrchestrator,
};

/// Intake -> OCR -> extraction -> profile merge -> cleanup, one task per document.
///
/// Every stage writes the persisted record first and then mirrors the change
/// into the job registry.
pub struct DocumentPipeline {
    documents: Arc<dyn DocumentRepository>,
    registry: Arc<JobRegistry>,
    intake: IntakeService,
    ocr: OcrOrchestrator,
    extraction: ExtractionService,
    merger: ProfileMerger,
    cleanup: CleanupService,
}

impl DocumentPipeline {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        registry: Arc<JobRegistry>,
        intake: IntakeService,
        ocr: OcrOrchestrator,
        extraction: ExtractionService,
        merger: ProfileMerger,
        cleanup: CleanupService,
    ) -> Self {
        Self {
            documents,
            registry,
            intake,
            ocr,
            extraction,
            merger,
            cleanup,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn documents(&self) -> &Arc<dyn DocumentRepository> {
        &self.documents
    }

    /// Accept a document for processing; returns its new id
    pub async fn submit(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
        owner_id: &str,
    ) -> Result<Uuid> {
        self.intake.submit(data, file_name, mime_type, owner_id).await
    }

    pub async fn get_status(&self, id: Uuid) -> Option<JobStatus> {
        self.registry.get(id).await
    }

    pub async fn cleanup(&self, id: Uuid) -> Result<()> {
        self.cleanup.cleanup(id).await
    }

    pub async fn list_documents(&self, owner_id: &str) -> Result<Vec<CompanyDocument>> {
        self.documents.list_by_owner(owner_id).await
    }

    pub async fn get_profile(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        self.merger.get_profile(owner_id).await
    }

    /// Run the pipeline for `id` on its own task
    pub fn spawn_pipeline(self: &Arc<Self>, id: Uuid) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            match pipeline.run_pipeline(id).await {
                Ok(()) => {}
                Err(AppError::Conflict(msg)) => {
                    tracing::debug!("Skipped run for document {}: {}", id, msg)
                }
                Err(e) => tracing::error!("Processing run for document {} failed: {}", id, e),
            }
        })
    }

    /// Drive one pending document to a terminal state.
    ///
    /// OCR failures end the run normally with the document in `error`. `Err` means
    /// the document could not be claimed or a storage write failed mid-run.
    pub async fn run_pipeline(&self, id: Uuid) -> Result<()> {
        let document = self
            .documents
            .claim_for_processing(id)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Document {} is not pending", id)))?;

        tracing::info!("Processing document {} ({})", id, document.file_name);

        let mut processing = JobStatus::from_document(&document);
        processing.message = Some("Submitting to OCR".to_string());
        if !self.registry.register(processing).await {
            self.registry
                .update(id, |job| {
                    job.status = DocumentStatus::Processing;
                    job.message = Some("Submitting to OCR".to_string());
                })
                .await;
        }

        let result = self.process(&document).await;

        if let Err(e) = &result {
            tracing::error!("Abandoning run for document {}: {}", id, e);
            let message = format!("Processing abandoned: {}", e);
            self.registry
                .update(id, |job| {
                    job.status = DocumentStatus::Error;
                    job.message = Some(message);
                })
                .await;
        }

        result
    }

    async fn process(&self, document: &CompanyDocument) -> Result<()> {
        let id = document.id;
        let upload = OcrUpload {
            path: PathBuf::from(&document.file_path),
            file_name: document.file_name.clone(),
            mime_type: document.file_type.clone(),
        };

        let handle = match self.ocr.submit(&upload).await {
            Ok(handle) => handle,
            Err(failure) => return self.fail(id, &failure).await,
        };

        tracing::info!("Document {} submitted to OCR as {}", id, handle);
        self.registry
            .update(id, |job| {
                job.provider_handle = Some(handle.clone());
                job.message = Some("Waiting for OCR".to_string());
            })
            .await;

        let text = match self.ocr.poll(&handle).await {
            Ok(text) => text,
            Err(failure) => return self.fail(id, &failure).await,
        };

        self.registry
            .update(id, |job| {
                job.extracted_text = Some(text.clone());
                job.message = Some("Extracting company data".to_string());
            })
            .await;

        let outcome = self.extraction.extract(&text, &document.owner_id).await;
        match &outcome {
            ExtractionOutcome::Extracted(_) => {}
            ExtractionOutcome::ParseFailure { reason } | ExtractionOutcome::ServiceFailure { reason } => {
                tracing::warn!(
                    "Document {} completes without extracted attributes: {}",
                    id,
                    reason
                );
            }
        }
        let attributes = outcome.into_attributes();

        self.documents.mark_completed(id, &text, &attributes).await?;

        // The document stays completed even if the profile cannot be updated
        if let Err(e) = self
            .merger
            .merge_into_profile(&document.owner_id, &attributes)
            .await
        {
            tracing::error!(
                "Failed to merge document {} into profile of owner {}: {}",
                id,
                document.owner_id,
                e
            );
        }

        self.registry
            .update(id, |job| {
                job.status = DocumentStatus::Completed;
                job.extracted_data = Some(attributes);
                job.message = None;
            })
            .await;
        tracing::info!("Document {} processed", id);

        self.remove_upload(id).await;
        Ok(())
    }

    async fn fail(&self, id: Uuid, failure: &OcrFailure) -> Result<()> {
        let message = failure.to_string();
        self.documents.mark_error(id, &message).await?;
        self.registry
            .update(id, |job| {
                job.status = DocumentStatus::Error;
                job.message = Some(message);
            })
            .await;

        self.remove_upload(id).await;
        Ok(())
    }

    async fn remove_upload(&self, id: Uuid) {
        if let Err(e) = self.cleanup.cleanup(id).await {
            tracing::warn!("Cleanup for document {} failed: {}", id, e);
        }
    }
}
