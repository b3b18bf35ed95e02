//! Company document processing: intake, OCR, company-attribute extraction and
//! profile merging, driven by a background worker.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;

pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};
pub use crate::features::documents::{DocumentPipeline, DocumentProcessor, JobRegistry};
