mod document;
mod job_status;

pub use document::{CompanyDocument, CreateCompanyDocument, DocumentStatus};
pub use job_status::JobStatus;
