use validator::{Validate, ValidationError};

use crate::shared::validation::{validate_not_blank, MIME_TYPE_REGEX};

/// Allowed MIME types for document uploads
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/tiff",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Maximum document size in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Check if a MIME type is allowed
pub fn is_mime_type_allowed(content_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&content_type)
}

fn validate_allowed_mime_type(content_type: &str) -> Result<(), ValidationError> {
    if !is_mime_type_allowed(content_type) {
        let mut err = ValidationError::new("mime_type");
        err.message = Some(
            format!(
                "File type '{}' is not allowed. Allowed types: {}",
                content_type,
                ALLOWED_MIME_TYPES.join(", ")
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

fn validate_payload_size(data: &[u8]) -> Result<(), ValidationError> {
    if data.is_empty() {
        let mut err = ValidationError::new("empty");
        err.message = Some("File is empty".into());
        return Err(err);
    }
    if data.len() > MAX_FILE_SIZE {
        let mut err = ValidationError::new("too_large");
        err.message = Some(
            format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                MAX_FILE_SIZE,
                MAX_FILE_SIZE / 1024 / 1024
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// A document handed to intake, borrowed from the caller
#[derive(Debug, Validate)]
pub struct SubmitDocumentDto<'a> {
    #[validate(custom(function = validate_payload_size))]
    pub data: &'a [u8],

    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: &'a str,

    #[validate(
        regex(path = *MIME_TYPE_REGEX, message = "Invalid MIME type format"),
        custom(function = validate_allowed_mime_type)
    )]
    pub mime_type: &'a str,

    #[validate(custom(function = validate_not_blank, message = "Owner id is required"))]
    pub owner_id: &'a str,
}
