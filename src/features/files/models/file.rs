use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Whether AI analysis ran to completion for a record.
///
/// `failed` marks records whose metadata came from the fallback generator;
/// the upload itself still succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => ProcessingStatus::Completed,
            "failed" => ProcessingStatus::Failed,
            _ => ProcessingStatus::Pending,
        }
    }
}

/// Detected document language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentLanguage {
    No,
    En,
    Unknown,
}

impl DocumentLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentLanguage::No => "no",
            DocumentLanguage::En => "en",
            DocumentLanguage::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "no" => DocumentLanguage::No,
            "en" => DocumentLanguage::En,
            _ => DocumentLanguage::Unknown,
        }
    }
}

/// Sanitized classification metadata for one document.
///
/// Invariant: `sensitive_data` is true exactly when `sensitive_data_tags`
/// is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentAnalysis {
    /// Category name; predefined or model-invented
    pub category: String,
    /// True when `category` is not on the predefined list
    pub is_custom_category: bool,
    /// Lowercased, deduplicated, at most 10
    pub tags: Vec<String>,
    pub sensitive_data: bool,
    /// Kinds of personal data found in the document, at most 10
    pub sensitive_data_tags: Vec<String>,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
    pub language: DocumentLanguage,
    /// Short Norwegian description of the document
    pub description: String,
    /// AI-generated display name, at most 3 words
    pub ai_name: String,
    pub processing_status: ProcessingStatus,
    pub last_analyzed: DateTime<Utc>,
}

/// Durable metadata row for one uploaded document
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub original_name: String,
    /// Owner-scoped generated name; equals the object-store key
    pub generated_name: String,
    pub object_key: String,
    pub content_type: String,
    pub size: i64,
    /// sha256 of the stored bytes, hex-encoded
    pub checksum: String,
    pub analysis: DocumentAnalysis,
    pub uploaded_at: DateTime<Utc>,
}
