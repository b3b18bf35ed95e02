use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::company_profiles::models::CompanyAttributes;
use crate::features::documents::models::{CompanyDocument, CreateCompanyDocument, DocumentStatus};

/// Persistence port for company documents.
///
/// Status-changing methods only succeed along pending -> processing ->
/// {completed | error} (or pending -> error); anything else is `Conflict`.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document with status `pending`
    async fn create(&self, data: &CreateCompanyDocument) -> Result<CompanyDocument>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CompanyDocument>>;

    /// Newest first
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CompanyDocument>>;

    /// Oldest first, at most `limit`
    async fn list_pending(&self, limit: i64) -> Result<Vec<CompanyDocument>>;

    /// Move a pending document to `processing`. `None` when it was no longer
    /// pending, so at most one run ever owns a document.
    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<CompanyDocument>>;

    async fn mark_completed(
        &self,
        id: Uuid,
        extracted_text: &str,
        extracted_data: &CompanyAttributes,
    ) -> Result<CompanyDocument>;

    async fn mark_error(&self, id: Uuid, error_message: &str) -> Result<CompanyDocument>;
}

/// Postgres-backed document repository
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Turn a guarded UPDATE that matched nothing into NotFound or Conflict
    async fn rejected_transition(&self, id: Uuid, target: DocumentStatus) -> AppError {
        match self.get_by_id(id).await {
            Ok(Some(doc)) => AppError::Conflict(format!(
                "Document {} cannot move from {} to {}",
                id, doc.status, target
            )),
            Ok(None) => AppError::NotFound(format!("Document {} not found", id)),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn create(&self, data: &CreateCompanyDocument) -> Result<CompanyDocument> {
        let document = sqlx::query_as::<_, CompanyDocument>(
            r#"
            INSERT INTO company_documents (id, owner_id, file_name, file_type, file_path, file_size, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING *
            "#,
        )
        .bind(data.id)
        .bind(&data.owner_id)
        .bind(&data.file_name)
        .bind(&data.file_type)
        .bind(&data.file_path)
        .bind(data.file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create document {}: {:?}", data.id, e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Document created: {} for owner {} ({} bytes)",
            document.id,
            document.owner_id,
            document.file_size
        );
        Ok(document)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CompanyDocument>> {
        sqlx::query_as::<_, CompanyDocument>("SELECT * FROM company_documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get document {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CompanyDocument>> {
        sqlx::query_as::<_, CompanyDocument>(
            r#"
            SELECT * FROM company_documents
            WHERE owner_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list documents for owner {}: {:?}", owner_id, e);
            AppError::Database(e)
        })
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<CompanyDocument>> {
        sqlx::query_as::<_, CompanyDocument>(
            r#"
            SELECT * FROM company_documents
            WHERE status = 'pending'
            ORDER BY uploaded_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch pending documents: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<CompanyDocument>> {
        let claimed = sqlx::query_as::<_, CompanyDocument>(
            r#"
            UPDATE company_documents
            SET status = 'processing', processing_started_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to claim document {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        if claimed.is_none() && self.get_by_id(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        Ok(claimed)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        extracted_text: &str,
        extracted_data: &CompanyAttributes,
    ) -> Result<CompanyDocument> {
        let updated = sqlx::query_as::<_, CompanyDocument>(
            r#"
            UPDATE company_documents
            SET status = 'completed', extracted_text = $2, extracted_data = $3,
                error_message = NULL, processing_completed_at = NOW()
            WHERE id = $1 AND status = 'processing'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(extracted_text)
        .bind(Json(extracted_data))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark document {} as completed: {:?}", id, e);
            AppError::Database(e)
        })?;

        match updated {
            Some(document) => {
                tracing::info!("Document {} marked as completed", id);
                Ok(document)
            }
            None => Err(self.rejected_transition(id, DocumentStatus::Completed).await),
        }
    }

    async fn mark_error(&self, id: Uuid, error_message: &str) -> Result<CompanyDocument> {
        let updated = sqlx::query_as::<_, CompanyDocument>(
            r#"
            UPDATE company_documents
            SET status = 'error', error_message = $2, processing_completed_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(error_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark document {} as error: {:?}", id, e);
            AppError::Database(e)
        })?;

        match updated {
            Some(document) => {
                tracing::warn!("Document {} marked as error: {}", id, error_message);
                Ok(document)
            }
            None => Err(self.rejected_transition(id, DocumentStatus::Error).await),
        }
    }
}
