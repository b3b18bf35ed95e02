pub mod clients;
pub mod dtos;
pub mod models;
pub mod repositories;
pub mod services;
pub mod workers;

pub use services::{DocumentPipeline, JobRegistry};
pub use workers::DocumentProcessor;
