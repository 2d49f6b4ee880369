//! Prompt template management for the AI classifier.
//!
//! Templates are stored in `templates/prompts/` and use Jinja2 syntax.

pub mod engine;

pub use engine::{render_template, TemplateError};

use minijinja::Value;
use std::collections::HashMap;

use crate::shared::constants::ClassificationVocabulary;

/// What the classifier is being shown, from the model's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSubject {
    PdfDocument,
    Image,
}

impl PromptSubject {
    fn as_norwegian(&self) -> &'static str {
        match self {
            PromptSubject::PdfDocument => "PDF-dokumentet",
            PromptSubject::Image => "bildet/dokumentet",
        }
    }
}

/// Render the document-classification prompt.
///
/// The vocabulary lists and the JSON schema of the expected reply are
/// injected so the model answers within the fixed category/tag space.
pub fn render_classification_prompt(
    subject: PromptSubject,
    vocabulary: &ClassificationVocabulary,
    json_schema: &str,
) -> Result<String, TemplateError> {
    let mut ctx: HashMap<&str, Value> = HashMap::new();
    ctx.insert("subject", Value::from(subject.as_norwegian()));
    ctx.insert("categories", Value::from(vocabulary.categories.join(", ")));
    ctx.insert("tags", Value::from(vocabulary.tags.join(", ")));
    ctx.insert(
        "sensitive_tags",
        Value::from(vocabulary.sensitive_data_tags.join(", ")),
    );
    ctx.insert("json_schema", Value::from(json_schema));

    render_template("classification/analyze_document", &ctx)
}
