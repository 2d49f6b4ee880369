//! AI inference capability consumed by the classifier adapter.
//!
//! The provider receives document bytes plus a prompt and answers with free
//! text that is expected to embed one JSON object. Errors are categorized so
//! the orchestrator can route every failure mode to the fallback classifier.

pub mod openai_client;

pub use openai_client::OpenAiClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider rejected the file format: {0}")]
    UnsupportedFormat(String),

    #[error("Provider rate limit hit")]
    RateLimited,

    #[error("Provider quota exhausted")]
    QuotaExceeded,

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider transport error: {0}")]
    Transport(String),
}

/// External document-understanding model.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Submit a PDF to the document-capable endpoint; returns the raw
    /// completion text.
    async fn analyze_pdf(
        &self,
        data: &[u8],
        filename: &str,
        prompt: &str,
    ) -> Result<String, ProviderError>;

    /// Submit image bytes to the vision endpoint; returns the raw
    /// completion text.
    async fn analyze_image(&self, data: &[u8], prompt: &str) -> Result<String, ProviderError>;
}

/// Detect the image MIME type from the leading signature bytes.
///
/// Only PNG is distinguished; everything else is submitted as JPEG, which
/// matches what the capture clients produce.
pub fn detect_image_mime(data: &[u8]) -> &'static str {
    if data.len() >= 2 && data[0] == 0x89 && data[1] == 0x50 {
        "image/png"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature_is_detected() {
        assert_eq!(detect_image_mime(&[0x89, 0x50, 0x4e, 0x47]), "image/png");
    }

    #[test]
    fn everything_else_is_jpeg() {
        assert_eq!(detect_image_mime(&[0xff, 0xd8, 0xff]), "image/jpeg");
        assert_eq!(detect_image_mime(&[]), "image/jpeg");
    }
}
