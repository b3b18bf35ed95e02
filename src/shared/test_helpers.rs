//! In-memory storage and scripted external services for pipeline tests

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::company_profiles::clients::{JsonCompletionRequest, LanguageModel};
use crate::features::company_profiles::models::{CompanyAttributes, UserProfile};
use crate::features::company_profiles::repositories::ProfileRepository;
use crate::features::documents::clients::{OcrError, OcrProvider, OcrStatus, OcrUpload};
use crate::features::documents::models::{CompanyDocument, CreateCompanyDocument, DocumentStatus};
use crate::features::documents::repositories::DocumentRepository;

fn storage_failure() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Document storage that enforces the same guarded transitions as Postgres and
/// records every status each document passed through
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: Mutex<HashMap<Uuid, CompanyDocument>>,
    history: Mutex<HashMap<Uuid, Vec<DocumentStatus>>>,
    fail_create: AtomicBool,
    fail_completion: AtomicBool,
}

impl InMemoryDocumentRepository {
    /// Make every `create` fail with a database error
    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    /// Make every `mark_completed` fail with a database error
    pub fn fail_completion(&self) {
        self.fail_completion.store(true, Ordering::SeqCst);
    }

    pub fn status_history(&self, id: Uuid) -> Vec<DocumentStatus> {
        self.history
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn transition(
        &self,
        id: Uuid,
        target: DocumentStatus,
        apply: impl FnOnce(&mut CompanyDocument),
    ) -> Result<CompanyDocument> {
        let mut documents = self.documents.lock().unwrap();
        let doc = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", id)))?;

        if !doc.status.can_transition_to(target) {
            return Err(AppError::Conflict(format!(
                "Document {} cannot move from {} to {}",
                id, doc.status, target
            )));
        }

        doc.status = target;
        apply(doc);
        self.history
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .push(target);
        Ok(doc.clone())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, data: &CreateCompanyDocument) -> Result<CompanyDocument> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }

        let document = CompanyDocument {
            id: data.id,
            owner_id: data.owner_id.clone(),
            file_name: data.file_name.clone(),
            file_type: data.file_type.clone(),
            file_path: data.file_path.clone(),
            file_size: data.file_size,
            status: DocumentStatus::Pending,
            extracted_text: None,
            extracted_data: None,
            error_message: None,
            uploaded_at: Utc::now(),
            processing_started_at: None,
            processing_completed_at: None,
        };

        self.documents
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        self.history
            .lock()
            .unwrap()
            .insert(document.id, vec![DocumentStatus::Pending]);
        Ok(document)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CompanyDocument>> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CompanyDocument>> {
        let mut docs: Vec<CompanyDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(docs)
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<CompanyDocument>> {
        let mut docs: Vec<CompanyDocument> = self
            .documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.status == DocumentStatus::Pending)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        docs.truncate(limit.max(0) as usize);
        Ok(docs)
    }

    async fn claim_for_processing(&self, id: Uuid) -> Result<Option<CompanyDocument>> {
        match self.transition(id, DocumentStatus::Processing, |doc| {
            doc.processing_started_at = Some(Utc::now());
        }) {
            Ok(doc) => Ok(Some(doc)),
            Err(AppError::Conflict(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        extracted_text: &str,
        extracted_data: &CompanyAttributes,
    ) -> Result<CompanyDocument> {
        if self.fail_completion.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }

        self.transition(id, DocumentStatus::Completed, |doc| {
            doc.extracted_text = Some(extracted_text.to_string());
            doc.extracted_data = Some(Json(extracted_data.clone()));
            doc.error_message = None;
            doc.processing_completed_at = Some(Utc::now());
        })
    }

    async fn mark_error(&self, id: Uuid, error_message: &str) -> Result<CompanyDocument> {
        self.transition(id, DocumentStatus::Error, |doc| {
            doc.error_message = Some(error_message.to_string());
            doc.processing_completed_at = Some(Utc::now());
        })
    }
}

// =============================================================================
// PROFILES
// =============================================================================

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, UserProfile>>,
    fail_reads: AtomicBool,
    rival: Mutex<Option<UserProfile>>,
}

impl InMemoryProfileRepository {
    pub fn count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    /// Make every `get_by_owner` fail with an I/O error
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// On the next `create`, store `rival` instead and report the owner as
    /// taken, as if another run inserted first
    pub fn lose_next_create_to(&self, rival: UserProfile) {
        *self.rival.lock().unwrap() = Some(rival);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_by_owner(&self, owner_id: &str) -> Result<Option<UserProfile>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Io(std::io::Error::other("profile store unavailable")));
        }
        Ok(self.profiles.lock().unwrap().get(owner_id).cloned())
    }

    async fn create(&self, profile: &UserProfile) -> Result<Option<UserProfile>> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(rival) = self.rival.lock().unwrap().take() {
            profiles.insert(rival.owner_id.clone(), rival);
            return Ok(None);
        }
        if profiles.contains_key(&profile.owner_id) {
            return Ok(None);
        }
        profiles.insert(profile.owner_id.clone(), profile.clone());
        Ok(Some(profile.clone()))
    }

    async fn update(&self, profile: &UserProfile) -> Result<UserProfile> {
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(&profile.owner_id) {
            Some(stored) => {
                *stored = profile.clone();
                Ok(stored.clone())
            }
            None => Err(AppError::NotFound(format!(
                "Profile for owner {} not found",
                profile.owner_id
            ))),
        }
    }
}

// =============================================================================
// OCR PROVIDER
// =============================================================================

/// OCR provider replaying a fixed script of status replies.
///
/// Once the script runs out every status query reports in-progress.
pub struct ScriptedOcrProvider {
    submit_result: std::result::Result<String, OcrError>,
    statuses: Mutex<VecDeque<std::result::Result<OcrStatus, OcrError>>>,
    submit_calls: AtomicUsize,
    status_calls: Mutex<Vec<Instant>>,
}

impl ScriptedOcrProvider {
    pub fn accepting(handle: &str) -> Self {
        Self {
            submit_result: Ok(handle.to_string()),
            statuses: Mutex::new(VecDeque::new()),
            submit_calls: AtomicUsize::new(0),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            submit_result: Err(OcrError::Submission(message.to_string())),
            ..Self::accepting("")
        }
    }

    pub fn with_statuses(
        self,
        statuses: Vec<std::result::Result<OcrStatus, OcrError>>,
    ) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Script: `in_progress` polls of in-progress, then complete with `text`
    pub fn completing_after(handle: &str, in_progress: usize, text: &str) -> Self {
        let mut statuses = vec![Ok(OcrStatus::InProgress); in_progress];
        statuses.push(Ok(OcrStatus::Complete {
            text: text.to_string(),
        }));
        Self::accepting(handle).with_statuses(statuses)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    /// Instants at which each status query arrived
    pub fn status_call_times(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrProvider for ScriptedOcrProvider {
    async fn submit(&self, _upload: &OcrUpload) -> std::result::Result<String, OcrError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_result.clone()
    }

    async fn status(&self, _handle: &str) -> std::result::Result<OcrStatus, OcrError> {
        self.status_calls.lock().unwrap().push(Instant::now());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OcrStatus::InProgress))
    }
}

// =============================================================================
// LANGUAGE MODEL
// =============================================================================

/// Language model that always gives the same reply (or failure) and records
/// every request it received
pub struct ScriptedLanguageModel {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<JsonCompletionRequest>>,
}

impl ScriptedLanguageModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<JsonCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete_json(&self, request: &JsonCompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .map_err(|reason| AppError::ExternalServiceError(format!("LLM request failed: {}", reason)))
    }
}
