//! Storage module for uploaded documents
//!
//! Provides local filesystem storage with sanitized, collision-resistant names.

mod local_storage;

pub use local_storage::{sanitize_file_name, LocalFileStorage};
