//! Classifier adapter: feeds documents to the inference provider and maps
//! the reply into sanitized [`DocumentAnalysis`] metadata.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::features::files::models::{
    DocumentAnalysis, DocumentLanguage, ProcessingStatus,
};
use crate::features::files::services::FallbackClassifier;
use crate::modules::inference::{InferenceProvider, ProviderError};
use crate::shared::constants::ClassificationVocabulary;
use crate::shared::llm::{json_schema_string, parse_llm_json};
use crate::shared::prompts::{render_classification_prompt, PromptSubject, TemplateError};
use crate::shared::raster::{render_document, RenderError};

/// Maximum number of whitespace-separated words kept in `ai_name`
const MAX_AI_NAME_WORDS: usize = 3;

/// Default confidence when the provider omits or mangles the field
const DEFAULT_CONFIDENCE: f64 = 0.5;

const DEFAULT_DESCRIPTION: &str = "Dokument lastet opp til systemet";
const DEFAULT_AI_NAME: &str = "Dokument";

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Unsupported file type for classification: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unparsable classifier response: {0}")]
    UnparsableResponse(String),

    #[error("Prompt rendering failed: {0}")]
    Prompt(#[from] TemplateError),
}

/// Which path produced the metadata for a file
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Provider-derived, sanitized metadata
    Ai(DocumentAnalysis),
    /// Locally generated substitute after a classification failure
    Fallback(DocumentAnalysis),
}

/// Raw classifier reply, exactly as the provider names the fields.
/// Every field is optional; sanitization fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAnalysis {
    pub category: Option<String>,
    pub is_custom_category: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub sensitive_data: Option<bool>,
    pub sensitive_data_tags: Option<Vec<String>>,
    pub confidence: Option<f64>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub ai_name: Option<String>,
}

pub struct AnalysisService {
    provider: Arc<dyn InferenceProvider>,
    vocabulary: Arc<ClassificationVocabulary>,
    fallback: Arc<FallbackClassifier>,
}

impl AnalysisService {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        vocabulary: Arc<ClassificationVocabulary>,
        fallback: Arc<FallbackClassifier>,
    ) -> Self {
        Self {
            provider,
            vocabulary,
            fallback,
        }
    }

    /// Classify a document through the provider.
    ///
    /// PDFs hit the document endpoint first and get one retry through the
    /// vision path before the error surfaces. Non-PDFs are rasterized and
    /// sent to the vision endpoint directly.
    pub async fn analyze(
        &self,
        data: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<DocumentAnalysis, ClassificationError> {
        debug!("Starting document analysis for: {} ({})", filename, content_type);

        let schema = json_schema_string::<RawAnalysis>();

        if content_type == "application/pdf" {
            let prompt =
                render_classification_prompt(PromptSubject::PdfDocument, &self.vocabulary, &schema)?;

            match self.provider.analyze_pdf(data, filename, &prompt).await {
                Ok(text) => return self.parse_and_sanitize(&text),
                Err(e) => {
                    warn!(
                        "Document endpoint failed for {} ({}), retrying via vision path",
                        filename, e
                    );
                }
            }
        }

        let rendered =
            render_document(data, filename, content_type).map_err(|e| match e {
                RenderError::UnsupportedType(kind) => ClassificationError::Unsupported(kind),
                other => ClassificationError::UnparsableResponse(other.to_string()),
            })?;

        let prompt = render_classification_prompt(PromptSubject::Image, &self.vocabulary, &schema)?;
        let text = self
            .provider
            .analyze_image(&rendered.into_bytes(), &prompt)
            .await?;

        self.parse_and_sanitize(&text)
    }

    /// Classify with the guaranteed fallback: a provider failure degrades
    /// metadata quality but never drops the file.
    pub async fn analyze_with_fallback(
        &self,
        data: &[u8],
        filename: &str,
        content_type: &str,
    ) -> AnalysisOutcome {
        match self.analyze(data, filename, content_type).await {
            Ok(analysis) => AnalysisOutcome::Ai(analysis),
            Err(e) => {
                warn!("AI analysis failed for {}, using fallback: {}", filename, e);
                AnalysisOutcome::Fallback(self.fallback.classify(
                    filename,
                    content_type,
                    data.len(),
                ))
            }
        }
    }

    fn parse_and_sanitize(&self, text: &str) -> Result<DocumentAnalysis, ClassificationError> {
        let raw: RawAnalysis =
            parse_llm_json(text).map_err(ClassificationError::UnparsableResponse)?;
        Ok(sanitize_analysis(raw, &self.vocabulary, Utc::now()))
    }
}

/// Normalize a raw classifier reply into a valid [`DocumentAnalysis`].
///
/// Applied to every provider reply regardless of how well-formed it looks;
/// idempotent, so re-sanitizing an already clean result changes nothing.
pub fn sanitize_analysis(
    raw: RawAnalysis,
    vocabulary: &ClassificationVocabulary,
    now: DateTime<Utc>,
) -> DocumentAnalysis {
    let category = raw
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| vocabulary.default_category.to_string());

    let mut tags = normalize_tags(raw.tags.unwrap_or_default(), vocabulary.max_tags);
    if tags.is_empty() {
        tags.push(vocabulary.default_tag.to_string());
    }

    let sensitive_data_tags =
        normalize_tags(raw.sensitive_data_tags.unwrap_or_default(), vocabulary.max_tags);

    let confidence = raw
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let language = match raw.language.as_deref() {
        None => DocumentLanguage::No,
        Some(value) => DocumentLanguage::parse(value.trim()),
    };

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let ai_name = raw
        .ai_name
        .map(|n| truncate_words(n.trim(), MAX_AI_NAME_WORDS))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_AI_NAME.to_string());

    DocumentAnalysis {
        // Never trust the provider's flag; recompute from the fixed list
        is_custom_category: !vocabulary.is_predefined_category(&category),
        category,
        // Derived, not taken from the reply
        sensitive_data: !sensitive_data_tags.is_empty(),
        tags,
        sensitive_data_tags,
        confidence,
        language,
        description,
        ai_name,
        processing_status: ProcessingStatus::Completed,
        last_analyzed: now,
    }
}

/// Trim, lowercase, drop empties, deduplicate, truncate
fn normalize_tags(tags: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len().min(max));
    for tag in tags {
        let cleaned = tag.trim().to_lowercase();
        if cleaned.is_empty() || seen.contains(&cleaned) {
            continue;
        }
        seen.push(cleaned);
        if seen.len() == max {
            break;
        }
    }
    seen
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        words[..max_words].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn vocab() -> Arc<ClassificationVocabulary> {
        Arc::new(ClassificationVocabulary::default())
    }

    /// Provider stub with scripted per-endpoint outcomes and call counters
    struct ScriptedProvider {
        pdf_reply: Result<String, ()>,
        image_reply: Result<String, ()>,
        pdf_calls: AtomicUsize,
        image_calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(pdf_reply: Result<String, ()>, image_reply: Result<String, ()>) -> Self {
            Self {
                pdf_reply,
                image_reply,
                pdf_calls: AtomicUsize::new(0),
                image_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InferenceProvider for ScriptedProvider {
        async fn analyze_pdf(
            &self,
            _data: &[u8],
            _filename: &str,
            _prompt: &str,
        ) -> Result<String, ProviderError> {
            self.pdf_calls.fetch_add(1, Ordering::SeqCst);
            self.pdf_reply
                .clone()
                .map_err(|_| ProviderError::RateLimited)
        }

        async fn analyze_image(&self, _data: &[u8], _prompt: &str) -> Result<String, ProviderError> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            self.image_reply
                .clone()
                .map_err(|_| ProviderError::Transport("connection reset".to_string()))
        }
    }

    fn service(provider: Arc<ScriptedProvider>) -> AnalysisService {
        let vocabulary = vocab();
        let fallback = Arc::new(FallbackClassifier::with_rng(
            Arc::clone(&vocabulary),
            StdRng::seed_from_u64(11),
        ));
        AnalysisService::new(provider, vocabulary, fallback)
    }

    const GOOD_REPLY: &str = r#"Her er analysen:
{"category": "Lønnslipp", "isCustomCategory": true, "tags": ["Lønn", " skatt ", "lønn"],
 "sensitiveData": false, "sensitiveDataTags": ["navn", "lønn"],
 "confidence": 0.91, "language": "no", "description": "Lønnslipp for mars",
 "aiName": "Lønnslipp mars 2026 detaljert"}"#;

    #[tokio::test]
    async fn valid_reply_is_parsed_and_sanitized() {
        let provider = Arc::new(ScriptedProvider::new(
            Err(()),
            Ok(GOOD_REPLY.to_string()),
        ));
        let svc = service(Arc::clone(&provider));

        let analysis = svc
            .analyze(b"innhold", "lønnslipp.txt", "text/plain")
            .await
            .unwrap();

        assert_eq!(analysis.category, "Lønnslipp");
        // Provider lied about isCustomCategory; membership test wins
        assert!(!analysis.is_custom_category);
        // Lowercased and deduplicated
        assert_eq!(analysis.tags, vec!["lønn", "skatt"]);
        // Derived from the tag list, not the provider's flag
        assert!(analysis.sensitive_data);
        // Truncated to three words
        assert_eq!(analysis.ai_name, "Lønnslipp mars 2026");
        assert_eq!(analysis.processing_status, ProcessingStatus::Completed);
        assert_eq!(provider.image_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.pdf_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pdf_failure_retries_through_vision_path() {
        let provider = Arc::new(ScriptedProvider::new(
            Err(()),
            Ok(GOOD_REPLY.to_string()),
        ));
        let svc = service(Arc::clone(&provider));

        let analysis = svc
            .analyze(b"%PDF-1.4", "lonn.pdf", "application/pdf")
            .await
            .unwrap();

        assert_eq!(analysis.category, "Lønnslipp");
        assert_eq!(provider.pdf_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsupported_type_never_reaches_the_provider() {
        let provider = Arc::new(ScriptedProvider::new(Err(()), Err(())));
        let svc = service(Arc::clone(&provider));

        let err = svc
            .analyze(b"PK..", "arkiv.zip", "application/zip")
            .await
            .unwrap_err();

        assert!(matches!(err, ClassificationError::Unsupported(_)));
        assert_eq!(provider.pdf_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn garbage_reply_is_an_unparsable_error() {
        let provider = Arc::new(ScriptedProvider::new(
            Err(()),
            Ok("Beklager, jeg kan ikke analysere dette.".to_string()),
        ));
        let svc = service(provider);

        let err = svc
            .analyze(b"tekst", "notat.txt", "text/plain")
            .await
            .unwrap_err();

        assert!(matches!(err, ClassificationError::UnparsableResponse(_)));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback_outcome() {
        let provider = Arc::new(ScriptedProvider::new(Err(()), Err(())));
        let svc = service(provider);

        let outcome = svc
            .analyze_with_fallback(b"tekst", "lønnslipp.txt", "text/plain")
            .await;

        match outcome {
            AnalysisOutcome::Fallback(analysis) => {
                assert_eq!(analysis.category, "Lønnslipp");
                assert!(analysis.sensitive_data);
            }
            AnalysisOutcome::Ai(_) => panic!("expected fallback outcome"),
        }
    }

    #[test]
    fn sanitize_fills_every_gap() {
        let analysis = sanitize_analysis(RawAnalysis::default(), &vocab(), Utc::now());

        assert_eq!(analysis.category, "Offentlig dokument");
        assert!(!analysis.is_custom_category);
        assert_eq!(analysis.tags, vec!["dokument"]);
        assert!(!analysis.sensitive_data);
        assert!(analysis.sensitive_data_tags.is_empty());
        assert_eq!(analysis.confidence, 0.5);
        assert_eq!(analysis.language, DocumentLanguage::No);
        assert_eq!(analysis.description, DEFAULT_DESCRIPTION);
        assert_eq!(analysis.ai_name, DEFAULT_AI_NAME);
    }

    #[test]
    fn sanitize_clamps_and_truncates() {
        let raw = RawAnalysis {
            category: Some("  Egen kategori  ".to_string()),
            confidence: Some(7.5),
            tags: Some((0..20).map(|i| format!("tag{}", i)).collect()),
            sensitive_data_tags: Some(vec!["NAVN".to_string(), "".to_string()]),
            language: Some("sv".to_string()),
            ..RawAnalysis::default()
        };

        let analysis = sanitize_analysis(raw, &vocab(), Utc::now());

        assert_eq!(analysis.category, "Egen kategori");
        assert!(analysis.is_custom_category);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.tags.len(), 10);
        assert_eq!(analysis.sensitive_data_tags, vec!["navn"]);
        assert!(analysis.sensitive_data);
        assert_eq!(analysis.language, DocumentLanguage::Unknown);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = RawAnalysis {
            category: Some("Pass".to_string()),
            is_custom_category: Some(true),
            tags: Some(vec!["  Viktig ".to_string(), "pass".to_string()]),
            sensitive_data: Some(false),
            sensitive_data_tags: Some(vec!["Navn".to_string()]),
            confidence: Some(1.7),
            language: Some("en".to_string()),
            description: Some("Passdokument".to_string()),
            ai_name: Some("Pass for Kari Nordmann".to_string()),
        };

        let now = Utc::now();
        let once = sanitize_analysis(raw, &vocab(), now);

        let again = RawAnalysis {
            category: Some(once.category.clone()),
            is_custom_category: Some(once.is_custom_category),
            tags: Some(once.tags.clone()),
            sensitive_data: Some(once.sensitive_data),
            sensitive_data_tags: Some(once.sensitive_data_tags.clone()),
            confidence: Some(once.confidence),
            language: Some(once.language.as_str().to_string()),
            description: Some(once.description.clone()),
            ai_name: Some(once.ai_name.clone()),
        };
        let twice = sanitize_analysis(again, &vocab(), now);

        assert_eq!(once, twice);
    }

    #[test]
    fn sensitive_flag_tracks_tag_emptiness() {
        let with_tags = sanitize_analysis(
            RawAnalysis {
                sensitive_data: Some(false),
                sensitive_data_tags: Some(vec!["adresse".to_string()]),
                ..RawAnalysis::default()
            },
            &vocab(),
            Utc::now(),
        );
        assert!(with_tags.sensitive_data);

        let without_tags = sanitize_analysis(
            RawAnalysis {
                sensitive_data: Some(true),
                sensitive_data_tags: Some(vec![]),
                ..RawAnalysis::default()
            },
            &vocab(),
            Utc::now(),
        );
        assert!(!without_tags.sensitive_data);
    }
}
