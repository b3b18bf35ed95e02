mod cleanup_service;
mod intake_service;
mod job_registry;
mod ocr_orchestrator;
mod pipeline_service;

pub use cleanup_service::CleanupService;
pub use intake_service::IntakeService;
pub use job_registry::JobRegistry;
pub use ocr_orchestrator::{OcrFailure, OcrOrchestrator, PollPolicy, EMPTY_OCR_TEXT_MESSAGE};
pub use pipeline_service::DocumentPipeline;
