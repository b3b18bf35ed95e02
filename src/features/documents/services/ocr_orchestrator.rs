use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::OcrConfig;
use crate::features::documents::clients::{OcrError, OcrProvider, OcrStatus, OcrUpload};

/// Message used when the provider reports completion but returns no text
pub const EMPTY_OCR_TEXT_MESSAGE: &str = "OCR completed without extracted text";

/// Fixed-delay polling budget for OCR status checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(OcrConfig::DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: OcrConfig::DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts.max(1),
        }
    }

    /// Worst-case time spent waiting between status checks; `None` on overflow
    pub fn budget(&self) -> Option<Duration> {
        self.interval.checked_mul(self.max_attempts)
    }
}

/// Terminal OCR failures; the display text is what gets persisted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcrFailure {
    #[error("{0}")]
    Submission(String),

    #[error("{0}")]
    ProviderReported(String),

    /// A transient failure that landed on the final attempt
    #[error("{0}")]
    Transient(String),

    #[error("OCR processing timed out after {attempts} status checks")]
    Timeout { attempts: u32 },
}

/// Drives a stored document through provider submission and bounded polling
pub struct OcrOrchestrator {
    provider: Arc<dyn OcrProvider>,
    policy: PollPolicy,
}

impl OcrOrchestrator {
    pub fn new(provider: Arc<dyn OcrProvider>, policy: PollPolicy) -> Self {
        Self { provider, policy }
    }

    /// Upload the document; returns the provider's correlation handle
    pub async fn submit(&self, upload: &OcrUpload) -> Result<String, OcrFailure> {
        self.provider.submit(upload).await.map_err(|e| match e {
            OcrError::Submission(msg) | OcrError::Transient(msg) => OcrFailure::Submission(msg),
        })
    }

    /// Poll until the provider finishes, fails, or the attempt budget runs out.
    ///
    /// The delay precedes every attempt. Returns the extracted text.
    pub async fn poll(&self, handle: &str) -> Result<String, OcrFailure> {
        let max_attempts = self.policy.max_attempts;
        tracing::debug!(
            "Polling OCR job {} up to {} times every {}s (budget: {})",
            handle,
            max_attempts,
            self.policy.interval.as_secs(),
            self.policy
                .budget()
                .map(|b| format!("{}s", b.as_secs()))
                .unwrap_or_else(|| "overflow".to_string())
        );

        for attempt in 1..=max_attempts {
            tokio::time::sleep(self.policy.interval).await;

            match self.provider.status(handle).await {
                Ok(OcrStatus::InProgress) => {
                    tracing::debug!(
                        "OCR job {} still processing (attempt {}/{})",
                        handle,
                        attempt,
                        max_attempts
                    );
                }
                Ok(OcrStatus::Complete { text }) => {
                    if text.trim().is_empty() {
                        return Err(OcrFailure::ProviderReported(
                            EMPTY_OCR_TEXT_MESSAGE.to_string(),
                        ));
                    }
                    tracing::info!(
                        "OCR job {} complete after {} attempt(s), {} chars",
                        handle,
                        attempt,
                        text.chars().count()
                    );
                    return Ok(text);
                }
                Ok(OcrStatus::Failed { message }) => {
                    tracing::warn!("OCR job {} failed: {}", handle, message);
                    return Err(OcrFailure::ProviderReported(message));
                }
                Err(e) if attempt == max_attempts => {
                    tracing::warn!("OCR job {} status check failed on final attempt: {}", handle, e);
                    return Err(OcrFailure::Transient(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!(
                        "OCR job {} status check failed (attempt {}/{}): {}",
                        handle,
                        attempt,
                        max_attempts,
                        e
                    );
                }
            }
        }

        tracing::warn!("OCR job {} timed out after {} attempts", handle, max_attempts);
        Err(OcrFailure::Timeout {
            attempts: max_attempts,
        })
    }
}
