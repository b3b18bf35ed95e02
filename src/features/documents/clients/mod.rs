mod llm_whisperer;

pub use llm_whisperer::{LlmWhispererClient, OcrError, OcrProvider, OcrStatus, OcrUpload};
