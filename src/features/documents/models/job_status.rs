use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::time::Instant;
use uuid::Uuid;

use super::{CompanyDocument, DocumentStatus};
use crate::features::company_profiles::models::CompanyAttributes;

/// In-memory view of a document's processing run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub document_id: Uuid,
    pub status: DocumentStatus,
    pub owner_id: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub message: Option<String>,
    /// Correlation handle returned by the OCR provider on submission
    pub provider_handle: Option<String>,
    pub extracted_text: Option<String>,
    pub extracted_data: Option<CompanyAttributes>,
    pub updated_at: DateTime<Utc>,
    /// When the job became terminal; drives registry retention
    #[serde(skip)]
    pub(crate) terminal_since: Option<Instant>,
}

impl JobStatus {
    pub fn pending(
        document_id: Uuid,
        owner_id: impl Into<String>,
        file_name: impl Into<String>,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            document_id,
            status: DocumentStatus::Pending,
            owner_id: owner_id.into(),
            file_name: file_name.into(),
            file_path: file_path.into(),
            message: None,
            provider_handle: None,
            extracted_text: None,
            extracted_data: None,
            updated_at: Utc::now(),
            terminal_since: None,
        }
    }

    /// Rebuild a job entry from the persisted record (e.g. after a restart)
    pub fn from_document(document: &CompanyDocument) -> Self {
        let mut job = Self::pending(
            document.id,
            document.owner_id.clone(),
            document.file_name.clone(),
            document.file_path.clone(),
        );
        job.status = document.status;
        job.message = document.error_message.clone();
        job.extracted_text = document.extracted_text.clone();
        job.extracted_data = document.extracted_data.as_ref().map(|data| data.0.clone());
        if job.status.is_terminal() {
            job.terminal_since = Some(Instant::now());
        }
        job
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
