//! Template engine for prompt management using Jinja2 syntax.
//!
//! Templates live under `templates/prompts/` and are compiled into the
//! binary, so rendering is deterministic and independent of the working
//! directory.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Global template environment
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Compiled-in templates, keyed by their path under `templates/prompts/`
const TEMPLATES: &[(&str, &str)] = &[(
    "classification/analyze_document",
    include_str!("../../../templates/prompts/classification/analyze_document.jinja"),
)];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for (name, content) in TEMPLATES {
        if let Err(e) = env.add_template(name, content) {
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
/// `template_name` is the path relative to `templates/prompts/` without the
/// `.jinja` extension (e.g. "classification/analyze_document").
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let env = get_environment();
    let template = env
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
