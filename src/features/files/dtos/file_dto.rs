use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::files::models::{DocumentAnalysis, FileRecord};

/// Batch upload request DTO for OpenAPI documentation.
/// Note: this struct is for Swagger UI documentation only; the handler
/// reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadBatchDto {
    /// The files to upload (repeat the field for each file)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: String,
}

/// One persisted document in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileResponseDto {
    /// Unique identifier for the file record
    pub id: Uuid,
    /// Original filename as uploaded
    pub original_name: String,
    /// Generated owner-scoped name (doubles as the object-store key)
    pub generated_name: String,
    /// Object-store key of the stored bytes
    pub object_key: String,
    /// Size of the file in bytes
    pub size: i64,
    /// MIME type of the file
    pub content_type: String,
    /// sha256 checksum of the stored bytes, hex-encoded
    pub checksum: String,
    /// Classification metadata (AI-derived or fallback)
    pub ai_metadata: DocumentAnalysis,
    /// Presigned download URL, when one was generated for this response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Timestamp when the file was uploaded
    pub uploaded_at: DateTime<Utc>,
}

impl FileResponseDto {
    pub fn from_record(record: FileRecord, url: Option<String>) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name,
            generated_name: record.generated_name,
            object_key: record.object_key,
            size: record.size,
            content_type: record.content_type,
            checksum: record.checksum,
            ai_metadata: record.analysis,
            url,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Response for a batch upload; partial success carries both sides
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadBatchResponseDto {
    pub uploaded_files: Vec<FileResponseDto>,
    /// Per-file failure reasons, omitted when everything succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    pub message: String,
}

/// Query filters for the file listing
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FileListQuery {
    /// Only records with this exact category
    pub category: Option<String>,
    /// Only records carrying this tag
    pub tag: Option<String>,
}

/// Response for the download-URL endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileUrlResponseDto {
    /// Presigned URL granting temporary read access
    pub url: String,
    /// URL lifetime in seconds
    pub expires_in: u32,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Confirmation that the file was deleted
    pub deleted: bool,
}
