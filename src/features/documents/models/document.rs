use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::features::company_profiles::models::CompanyAttributes;

/// Document processing status matching the `document_status` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl DocumentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Error)
    }

    /// Allowed moves: pending -> processing -> {completed | error}, plus pending -> error
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Error) | (Processing, Completed) | (Processing, Error)
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Processing => write!(f, "processing"),
            DocumentStatus::Completed => write!(f, "completed"),
            DocumentStatus::Error => write!(f, "error"),
        }
    }
}

/// Database model for an uploaded company document
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDocument {
    pub id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_path: String,
    pub file_size: i64,
    pub status: DocumentStatus,
    pub extracted_text: Option<String>,
    pub extracted_data: Option<Json<CompanyAttributes>>,
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
}

/// Data for creating a new document record
#[derive(Debug, Clone)]
pub struct CreateCompanyDocument {
    pub id: Uuid,
    pub owner_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_path: String,
    pub file_size: i64,
}
