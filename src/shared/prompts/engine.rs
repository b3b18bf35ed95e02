//! Template engine for prompt management using Jinja2 syntax.
//!
//! Templates are compiled into the binary from `templates/prompts/` so the
//! worker does not depend on its working directory.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// (name, source) pairs registered at first use
const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "company_extraction/system.jinja",
        include_str!("../../../templates/prompts/company_extraction/system.jinja"),
    ),
    (
        "company_extraction/user.jinja",
        include_str!("../../../templates/prompts/company_extraction/user.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for &(name, source) in EMBEDDED_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a template with the given context.
///
/// `template_name` is the path relative to `templates/prompts/`,
/// e.g. `company_extraction/user.jinja`.
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

pub fn template_exists(template_name: &str) -> bool {
    get_environment().get_template(template_name).is_ok()
}
