use std::sync::Arc;

use crate::core::config::LlmConfig;
use crate::features::company_profiles::clients::{JsonCompletionRequest, LanguageModel};
use crate::features::company_profiles::models::CompanyAttributes;
use crate::shared::llm::{parse_llm_response, LlmParse, LlmResponse};
use crate::shared::prompts::render_company_extraction_prompts;

/// Result of one extraction attempt.
///
/// Only `Extracted` carries attributes; both failure variants degrade to an
/// empty attribute set so OCR output is never discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Extracted(CompanyAttributes),
    /// The model answered but the reply was not the expected JSON object
    ParseFailure { reason: String },
    /// The model could not be called (transport, HTTP status, prompt rendering)
    ServiceFailure { reason: String },
}

impl ExtractionOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, ExtractionOutcome::Extracted(_))
    }

    pub fn into_attributes(self) -> CompanyAttributes {
        match self {
            ExtractionOutcome::Extracted(attributes) => attributes,
            ExtractionOutcome::ParseFailure { .. } | ExtractionOutcome::ServiceFailure { .. } => {
                CompanyAttributes::default()
            }
        }
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Derives structured company attributes from OCR text with a language model
pub struct ExtractionService {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
    max_input_chars: usize,
}

impl ExtractionService {
    pub fn new(llm: Arc<dyn LanguageModel>, temperature: f32, max_input_chars: usize) -> Self {
        Self {
            llm,
            temperature,
            max_input_chars,
        }
    }

    pub fn from_config(llm: Arc<dyn LanguageModel>, config: &LlmConfig) -> Self {
        Self::new(llm, config.temperature, config.max_input_chars)
    }

    /// Extract attributes from a document's text. Never fails.
    pub async fn extract(&self, text: &str, owner_id: &str) -> ExtractionOutcome {
        let (input, truncated) = truncate_chars(text, self.max_input_chars);

        tracing::debug!(
            "Extracting company attributes for owner {} ({} chars, truncated: {})",
            owner_id,
            input.chars().count(),
            truncated
        );

        let prompts = match render_company_extraction_prompts(
            input,
            &CompanyAttributes::json_schema_string(),
            truncated,
            self.max_input_chars,
        ) {
            Ok(prompts) => prompts,
            Err(e) => {
                tracing::error!("Failed to render extraction prompt: {}", e);
                return ExtractionOutcome::ServiceFailure {
                    reason: e.to_string(),
                };
            }
        };

        let request = JsonCompletionRequest {
            system: prompts.system,
            user: prompts.user,
            temperature: self.temperature,
        };

        let reply = match self.llm.complete_json(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Extraction call failed for owner {}: {}", owner_id, e);
                return ExtractionOutcome::ServiceFailure {
                    reason: e.to_string(),
                };
            }
        };

        tracing::debug!(
            "Raw LLM response (first 500 chars): {}",
            reply.chars().take(500).collect::<String>()
        );

        match parse_llm_response::<CompanyAttributes>(&reply) {
            LlmParse::Parsed(attributes) => ExtractionOutcome::Extracted(attributes.normalized()),
            LlmParse::Malformed { reason } => {
                tracing::warn!(
                    "Extraction reply for owner {} unusable, continuing without attributes",
                    owner_id
                );
                ExtractionOutcome::ParseFailure { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::ScriptedLanguageModel;

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), ("hello", false));
        assert_eq!(truncate_chars("hello", 5), ("hello", false));
        assert_eq!(truncate_chars("hello", 3), ("hel", true));
        // multi-byte characters count as one
        assert_eq!(truncate_chars("شركة مقاولات", 4), ("شركة", true));
    }

    #[tokio::test]
    async fn test_extract_parses_reply() {
        let llm = Arc::new(ScriptedLanguageModel::replying(
            r#"{"companyDescription": "Road works contractor", "businessType": "LLC",
                "companyActivities": ["Paving"], "mainIndustries": ["Construction"],
                "specializations": null}"#,
        ));
        let service = ExtractionService::new(llm.clone(), 0.2, 10_000);

        let outcome = service.extract("ACME Roads LLC", "owner-1").await;

        assert!(outcome.is_extracted());
        let attrs = outcome.into_attributes();
        assert_eq!(attrs.business_type.as_deref(), Some("LLC"));
        assert_eq!(attrs.main_industries, vec!["Construction"]);
        assert!(attrs.specializations.is_empty());

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, 0.2);
        assert!(requests[0].user.contains("ACME Roads LLC"));
    }

    #[tokio::test]
    async fn test_unparsable_reply_degrades_to_empty() {
        let llm = Arc::new(ScriptedLanguageModel::replying(
            "I'm sorry, I can't find company details in this text.",
        ));
        let service = ExtractionService::new(llm, 0.2, 10_000);

        let outcome = service.extract("blurry scan", "owner-1").await;

        assert!(matches!(outcome, ExtractionOutcome::ParseFailure { .. }));
        assert_eq!(outcome.into_attributes(), CompanyAttributes::default());
    }

    #[tokio::test]
    async fn test_service_failure_degrades_to_empty() {
        let llm = Arc::new(ScriptedLanguageModel::failing("connection reset"));
        let service = ExtractionService::new(llm, 0.2, 10_000);

        let outcome = service.extract("ACME", "owner-1").await;

        match &outcome {
            ExtractionOutcome::ServiceFailure { reason } => {
                assert!(reason.contains("connection reset"))
            }
            other => panic!("expected service failure, got {:?}", other),
        }
        assert!(outcome.into_attributes().is_empty());
    }

    #[tokio::test]
    async fn test_long_text_is_truncated_before_submission() {
        let llm = Arc::new(ScriptedLanguageModel::replying("{}"));
        let service = ExtractionService::new(llm.clone(), 0.2, 50);

        let text = format!("{}{}", "a".repeat(50), "TAIL-MARKER");
        service.extract(&text, "owner-1").await;

        let user_prompt = &llm.requests()[0].user;
        assert!(user_prompt.contains(&"a".repeat(50)));
        assert!(!user_prompt.contains("TAIL-MARKER"));
        assert!(user_prompt.contains("truncated to the first 50 characters"));
    }
}
