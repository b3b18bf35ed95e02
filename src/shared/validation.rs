use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Shape of a MIME type: `type/subtype`, optionally with `+suffix` or dots
    /// - Valid: "application/pdf", "image/svg+xml", "application/vnd.ms-excel"
    /// - Invalid: "pdf", "application/", "/pdf", "text/plain; charset=utf-8"
    pub static ref MIME_TYPE_REGEX: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9!#$&^_.+-]*/[a-z0-9][a-z0-9!#$&^_.+-]*$").unwrap();
}

/// Rejects strings that are empty or whitespace only
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
