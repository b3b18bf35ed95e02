mod document_dto;

pub use document_dto::{is_mime_type_allowed, SubmitDocumentDto, ALLOWED_MIME_TYPES, MAX_FILE_SIZE};
