use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::OcrConfig;

/// Default message when the provider reports an error without details
const DEFAULT_PROVIDER_ERROR: &str = "Error processing document with OCR";

/// Status of an OCR job as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrStatus {
    InProgress,
    Complete { text: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrError {
    /// The provider rejected the upload or could not be reached
    #[error("{0}")]
    Submission(String),

    /// Network failure, timeout or unexpected reply while checking status
    #[error("{0}")]
    Transient(String),
}

/// A stored document handed to the OCR provider
#[derive(Debug, Clone)]
pub struct OcrUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

/// Port for the external optical-recognition provider
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Upload a document; returns the provider's correlation handle
    async fn submit(&self, upload: &OcrUpload) -> Result<String, OcrError>;

    async fn status(&self, handle: &str) -> Result<OcrStatus, OcrError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: Option<String>,
    text: Option<String>,
    message: Option<String>,
}

impl StatusResponse {
    fn into_status(self) -> OcrStatus {
        match self.status.as_deref() {
            Some("complete") => OcrStatus::Complete {
                text: self.text.unwrap_or_default(),
            },
            Some("error") => OcrStatus::Failed {
                message: self
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PROVIDER_ERROR.to_string()),
            },
            _ => OcrStatus::InProgress,
        }
    }
}

/// Client for the LLMWhisperer OCR API
pub struct LlmWhispererClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    submit_timeout: Duration,
}

impl LlmWhispererClient {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            submit_timeout: config.submit_timeout,
        }
    }
}

#[async_trait]
impl OcrProvider for LlmWhispererClient {
    async fn submit(&self, upload: &OcrUpload) -> Result<String, OcrError> {
        let data = tokio::fs::read(&upload.path).await.map_err(|e| {
            OcrError::Submission(format!(
                "Failed to read stored document {}: {}",
                upload.path.display(),
                e
            ))
        })?;

        let part = Part::bytes(data)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| OcrError::Submission(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        let url = format!("{}/api/v2/whisper", self.base_url);
        tracing::debug!("Submitting {} to OCR provider", upload.file_name);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.submit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OCR submission request failed: {:?}", e);
                OcrError::Submission(format!("Error calling OCR provider: {}", e))
            })?;

        let status = response.status();
        let body: Option<SubmitResponse> = response.json().await.ok();

        match body {
            Some(SubmitResponse {
                hash: Some(hash), ..
            }) if status.is_success() && !hash.is_empty() => Ok(hash),
            other => {
                let message = other
                    .and_then(|b| b.message)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("Failed to process document with OCR (HTTP {})", status));
                tracing::warn!("OCR provider rejected submission: {}", message);
                Err(OcrError::Submission(message))
            }
        }
    }

    async fn status(&self, handle: &str) -> Result<OcrStatus, OcrError> {
        let url = format!("{}/api/v2/whisper/{}", self.base_url, handle);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| OcrError::Transient(format!("Error checking OCR status: {}", e)))?;

        let status = response.status();
        let body: StatusResponse = response.json().await.map_err(|e| {
            OcrError::Transient(format!("Invalid OCR status response (HTTP {}): {}", status, e))
        })?;

        // An explicit error status is authoritative whatever the HTTP code
        if body.status.as_deref() == Some("error") {
            return Ok(body.into_status());
        }

        if !status.is_success() {
            return Err(OcrError::Transient(format!(
                "OCR status check returned HTTP {}",
                status
            )));
        }

        Ok(body.into_status())
    }
}
