//! Object-store capability consumed by the upload pipeline.
//!
//! Production uses the MinIO/S3 client; tests substitute counting fakes.

pub mod minio_client;

pub use minio_client::MinIOClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to store object '{key}': {message}")]
    PutFailed { key: String, message: String },

    #[error("Failed to generate presigned URL for '{key}': {message}")]
    PresignFailed { key: String, message: String },

    #[error("Failed to delete object '{key}': {message}")]
    DeleteFailed { key: String, message: String },
}

/// Key-addressed blob storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write bytes under `key`; returns the key on success
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Temporary download URL for `key`
    async fn presigned_url(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError>;

    /// Remove the object under `key`
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
