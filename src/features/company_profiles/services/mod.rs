mod extraction_service;
mod profile_merger;

pub use extraction_service::{truncate_chars, ExtractionOutcome, ExtractionService};
pub use profile_merger::{merge_profile, ProfileMerger};
