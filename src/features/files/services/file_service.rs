//! Read/delete operations on persisted file records.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::models::FileRecord;
use crate::features::files::repository::{FileListFilter, FileRepository};
use crate::modules::storage::ObjectStorage;

/// A listed record together with its freshly generated download URL
#[derive(Debug)]
pub struct FileListEntry {
    pub record: FileRecord,
    /// None when presigning failed; the listing still succeeds
    pub url: Option<String>,
}

pub struct FileService {
    repository: Arc<dyn FileRepository>,
    storage: Arc<dyn ObjectStorage>,
    presigned_url_expiry_secs: u32,
}

impl FileService {
    pub fn new(
        repository: Arc<dyn FileRepository>,
        storage: Arc<dyn ObjectStorage>,
        presigned_url_expiry_secs: u32,
    ) -> Self {
        Self {
            repository,
            storage,
            presigned_url_expiry_secs,
        }
    }

    /// List the caller's records, newest first, each with a presigned
    /// download URL.
    pub async fn list_files(
        &self,
        owner_id: &str,
        filter: &FileListFilter,
    ) -> Result<Vec<FileListEntry>> {
        let records = self.repository.list_by_owner(owner_id, filter).await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let url = match self
                .storage
                .presigned_url(&record.object_key, self.presigned_url_expiry_secs)
                .await
            {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("Presigning failed for {}: {}", record.object_key, e);
                    None
                }
            };
            entries.push(FileListEntry { record, url });
        }

        Ok(entries)
    }

    /// Presigned download URL for one record, ownership checked.
    ///
    /// Returns the URL and its TTL in seconds.
    pub async fn get_download_url(&self, owner_id: &str, id: Uuid) -> Result<(String, u32)> {
        let record = self
            .repository
            .find_by_id(id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let url = self
            .storage
            .presigned_url(&record.object_key, self.presigned_url_expiry_secs)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to generate access URL: {}", e)))?;

        Ok((url, self.presigned_url_expiry_secs))
    }

    /// Delete a record and its stored object, ownership checked.
    ///
    /// The object-store delete is best-effort: a failure there is logged
    /// and the database row is removed regardless.
    pub async fn delete_file(&self, owner_id: &str, id: Uuid) -> Result<()> {
        let record = self
            .repository
            .find_by_id(id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if let Err(e) = self.storage.delete(&record.object_key).await {
            warn!(
                "Failed to delete object {} from storage: {}. Continuing with database deletion.",
                record.object_key, e
            );
        } else {
            debug!("Deleted object from storage: {}", record.object_key);
        }

        let deleted = self.repository.delete_by_id(id, owner_id).await?;
        if !deleted {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        info!("File deleted: id={}, key={}", id, record.object_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::models::{
        DocumentAnalysis, DocumentLanguage, ProcessingStatus,
    };
    use crate::modules::storage::StorageError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn record(owner_id: &str) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            original_name: "pass.pdf".to_string(),
            generated_name: format!("{}/1-abc-pass.pdf", owner_id),
            object_key: format!("{}/1-abc-pass.pdf", owner_id),
            content_type: "application/pdf".to_string(),
            size: 1024,
            checksum: "00".repeat(32),
            analysis: DocumentAnalysis {
                category: "Pass".to_string(),
                is_custom_category: false,
                tags: vec!["pdf".to_string()],
                sensitive_data: true,
                sensitive_data_tags: vec!["navn".to_string()],
                confidence: 0.9,
                language: DocumentLanguage::No,
                description: "Passkopi".to_string(),
                ai_name: "Pass".to_string(),
                processing_status: ProcessingStatus::Completed,
                last_analyzed: Utc::now(),
            },
            uploaded_at: Utc::now(),
        }
    }

    struct SeededRepository {
        records: Mutex<Vec<FileRecord>>,
        deletes: AtomicUsize,
    }

    impl SeededRepository {
        fn with(records: Vec<FileRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                deletes: AtomicUsize::new(0),
            }
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
        }
    }

    #[async_trait]
    impl FileRepository for SeededRepository {
        async fn insert(&self, record: &FileRecord) -> Result<()> {
            self.records
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(record.clone());
            Ok(())
        }

        async fn list_by_owner(
            &self,
            owner_id: &str,
            _filter: &FileListFilter,
        ) -> Result<Vec<FileRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .filter(|r| r.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<FileRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .find(|r| r.id == id && r.owner_id == owner_id)
                .cloned())
        }

        async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<bool> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            let before = records.len();
            records.retain(|r| !(r.id == id && r.owner_id == owner_id));
            Ok(records.len() < before)
        }
    }

    struct FlakyStorage {
        fail_deletes: bool,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn put(
            &self,
            key: &str,
            _data: Vec<u8>,
            _content_type: &str,
        ) -> std::result::Result<String, StorageError> {
            Ok(key.to_string())
        }

        async fn presigned_url(
            &self,
            key: &str,
            ttl_secs: u32,
        ) -> std::result::Result<String, StorageError> {
            Ok(format!("https://minio.local/{}?expires={}", key, ttl_secs))
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            if self.fail_deletes {
                return Err(StorageError::DeleteFailed {
                    key: key.to_string(),
                    message: "access denied".to_string(),
                });
            }
            Ok(())
        }
    }

    fn service(repository: Arc<SeededRepository>, fail_deletes: bool) -> FileService {
        FileService::new(
            repository,
            Arc::new(FlakyStorage { fail_deletes }),
            3600,
        )
    }

    #[tokio::test]
    async fn listing_includes_presigned_urls() {
        let repository = Arc::new(SeededRepository::with(vec![record("user-a")]));
        let svc = service(Arc::clone(&repository), false);

        let entries = svc
            .list_files("user-a", &FileListFilter::default())
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        let url = entries[0].url.as_deref().unwrap();
        assert!(url.contains("expires=3600"));
    }

    #[tokio::test]
    async fn foreign_owner_cannot_delete_record() {
        let owned = record("user-a");
        let id = owned.id;
        let repository = Arc::new(SeededRepository::with(vec![owned]));
        let svc = service(Arc::clone(&repository), false);

        let result = svc.delete_file("user-b", id).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        // Record remains in persistence
        assert_eq!(repository.len(), 1);
        assert_eq!(repository.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn storage_delete_failure_does_not_block_db_delete() {
        let owned = record("user-a");
        let id = owned.id;
        let repository = Arc::new(SeededRepository::with(vec![owned]));
        let svc = service(Arc::clone(&repository), true);

        svc.delete_file("user-a", id).await.unwrap();

        assert_eq!(repository.len(), 0);
    }

    #[tokio::test]
    async fn download_url_requires_ownership() {
        let owned = record("user-a");
        let id = owned.id;
        let repository = Arc::new(SeededRepository::with(vec![owned]));
        let svc = service(repository, false);

        assert!(svc.get_download_url("user-a", id).await.is_ok());
        assert!(matches!(
            svc.get_download_url("user-b", id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
