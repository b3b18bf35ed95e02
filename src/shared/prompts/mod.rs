//! Prompt templates for language-model calls.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

/// System and user prompt for one extraction request
#[derive(Debug, Clone)]
pub struct ExtractionPrompts {
    pub system: String,
    pub user: String,
}

/// Render the company-attribute extraction prompts.
///
/// `document_text` must already be truncated; `truncated` only controls the
/// note telling the model it sees a prefix of the document.
pub fn render_company_extraction_prompts(
    document_text: &str,
    json_schema: &str,
    truncated: bool,
    max_chars: usize,
) -> Result<ExtractionPrompts, TemplateError> {
    let system = render_template("company_extraction/system.jinja", &HashMap::new())?;

    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("document_text", Value::from(document_text));
    ctx.insert("json_schema", Value::from(json_schema));
    ctx.insert("truncated", Value::from(truncated));
    ctx.insert("max_chars", Value::from(max_chars));
    let user = render_template("company_extraction/user.jinja", &ctx)?;

    Ok(ExtractionPrompts { system, user })
}
