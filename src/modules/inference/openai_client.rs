//! OpenAI-compatible inference client.
//!
//! PDFs go through the Files API and are referenced from a chat completion;
//! the uploaded file handle is deleted again on every exit path. Images are
//! inlined as base64 data URLs against the vision endpoint.

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::AiConfig;
use crate::core::error::AppError;
use crate::modules::inference::{detect_image_mime, InferenceProvider, ProviderError};

/// Completion budget for a classification answer
const MAX_COMPLETION_TOKENS: u32 = 800;

/// Low temperature for consistent categorization
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct FileUploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &AiConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Upload a PDF to the provider's Files API; returns the file handle id
    async fn upload_file(&self, data: &[u8], filename: &str) -> Result<String, ProviderError> {
        let part = multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let form = multipart::Form::new()
            .text("purpose", "user_data")
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let upload: FileUploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!("Uploaded document to provider, file id: {}", upload.id);
        Ok(upload.id)
    }

    /// Delete an uploaded file handle. Best-effort; failures are logged.
    async fn delete_file(&self, file_id: &str) {
        let result = self
            .http
            .delete(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Cleaned up provider file handle: {}", file_id);
            }
            Ok(response) => {
                warn!(
                    "Failed to clean up provider file handle {}: HTTP {}",
                    file_id,
                    response.status()
                );
            }
            Err(e) => {
                warn!("Failed to clean up provider file handle {}: {}", file_id, e);
            }
        }
    }

    async fn chat_completion(
        &self,
        content: serde_json::Value,
    ) -> Result<String, ProviderError> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": content}],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": TEMPERATURE,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("No completion content".to_string()))
    }

    /// Map HTTP failures onto the provider error taxonomy
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body_lower = body.to_lowercase();

        if status.as_u16() == 429 {
            if body_lower.contains("insufficient_quota") || body_lower.contains("quota") {
                return Err(ProviderError::QuotaExceeded);
            }
            return Err(ProviderError::RateLimited);
        }

        if status.is_client_error()
            && (body_lower.contains("unsupported") || body_lower.contains("invalid file"))
        {
            let snippet: String = body.chars().take(200).collect();
            return Err(ProviderError::UnsupportedFormat(snippet));
        }

        let snippet: String = body.chars().take(200).collect();
        Err(ProviderError::Transport(format!("HTTP {}: {}", status, snippet)))
    }
}

#[async_trait]
impl InferenceProvider for OpenAiClient {
    async fn analyze_pdf(
        &self,
        data: &[u8],
        filename: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let file_id = self.upload_file(data, filename).await?;

        let content = json!([
            {"type": "file", "file": {"file_id": file_id}},
            {"type": "text", "text": prompt},
        ]);

        // The uploaded handle is scoped to this one call: delete it whether
        // the completion succeeded or not.
        let result = self.chat_completion(content).await;
        self.delete_file(&file_id).await;
        result
    }

    async fn analyze_image(&self, data: &[u8], prompt: &str) -> Result<String, ProviderError> {
        let mime = detect_image_mime(data);
        let encoded = BASE64_STANDARD.encode(data);

        let content = json!([
            {"type": "text", "text": prompt},
            {
                "type": "image_url",
                "image_url": {"url": format!("data:{};base64,{}", mime, encoded)},
            },
        ]);

        self.chat_completion(content).await
    }
}
