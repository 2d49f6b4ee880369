use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{delete_file, get_file_url, list_files, upload_files};
use crate::features::files::services::{FileService, UploadService};
use crate::shared::constants::MAX_FILE_SIZE;

/// Batch bodies hold several files plus multipart overhead; allow up to
/// twenty max-size files per request
const MAX_UPLOAD_BODY_SIZE: usize = 20 * (MAX_FILE_SIZE + 1024 * 1024);

#[derive(Clone)]
pub struct FilesState {
    pub upload_service: Arc<UploadService>,
    pub file_service: Arc<FileService>,
}

/// Create routes for the files feature
pub fn routes(upload_service: Arc<UploadService>, file_service: Arc<FileService>) -> Router {
    let state = FilesState {
        upload_service,
        file_service,
    };

    Router::new()
        .route(
            "/api/files/upload",
            post(upload_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_SIZE)),
        )
        .route("/api/files", get(list_files))
        .route("/api/files/{id}/url", get(get_file_url))
        .route("/api/files/{id}", delete(delete_file))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use crate::features::files::models::FileRecord;
    use crate::features::files::repository::{FileListFilter, FileRepository};
    use crate::features::files::services::{AnalysisService, FallbackClassifier};
    use crate::modules::inference::{InferenceProvider, ProviderError};
    use crate::modules::storage::{ObjectStorage, StorageError};
    use crate::shared::constants::{ClassificationVocabulary, UploadPolicy};
    use crate::shared::test_helpers::with_test_auth;
    use async_trait::async_trait;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct MemoryStorage;

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
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
            _ttl_secs: u32,
        ) -> std::result::Result<String, StorageError> {
            Ok(format!("https://minio.local/{}", key))
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), StorageError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryRepository {
        records: Mutex<Vec<FileRecord>>,
    }

    #[async_trait]
    impl FileRepository for MemoryRepository {
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
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            let before = records.len();
            records.retain(|r| !(r.id == id && r.owner_id == owner_id));
            Ok(records.len() < before)
        }
    }

    /// Provider that always fails, forcing the fallback path
    struct DownProvider;

    #[async_trait]
    impl InferenceProvider for DownProvider {
        async fn analyze_pdf(
            &self,
            _data: &[u8],
            _filename: &str,
            _prompt: &str,
        ) -> std::result::Result<String, ProviderError> {
            Err(ProviderError::Transport("provider down".to_string()))
        }

        async fn analyze_image(
            &self,
            _data: &[u8],
            _prompt: &str,
        ) -> std::result::Result<String, ProviderError> {
            Err(ProviderError::Transport("provider down".to_string()))
        }
    }

    fn test_server() -> TestServer {
        let vocabulary = std::sync::Arc::new(ClassificationVocabulary::default());
        let fallback = std::sync::Arc::new(FallbackClassifier::with_rng(
            std::sync::Arc::clone(&vocabulary),
            StdRng::seed_from_u64(5),
        ));
        let analysis = std::sync::Arc::new(AnalysisService::new(
            std::sync::Arc::new(DownProvider),
            vocabulary,
            fallback,
        ));
        let storage = std::sync::Arc::new(MemoryStorage);
        let repository = std::sync::Arc::new(MemoryRepository::default());

        let upload_service = std::sync::Arc::new(UploadService::with_rng(
            storage.clone(),
            repository.clone(),
            analysis,
            std::sync::Arc::new(UploadPolicy::default()),
            2,
            StdRng::seed_from_u64(9),
        ));
        let file_service = std::sync::Arc::new(FileService::new(repository, storage, 3600));

        let app = with_test_auth(routes(upload_service, file_service));
        TestServer::new(app).expect("test server")
    }

    fn text_part(content: &str, filename: &str) -> Part {
        Part::bytes(content.as_bytes().to_vec())
            .file_name(filename.to_string())
            .mime_type("text/plain")
    }

    #[tokio::test]
    async fn upload_persists_fallback_metadata_when_provider_is_down() {
        let server = test_server();

        let form = MultipartForm::new().add_part("files", text_part("kr 34 500", "lønnslipp.txt"));
        let response = server.post("/api/files/upload").multipart(form).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);

        let uploaded = &body["data"]["uploaded_files"];
        assert_eq!(uploaded.as_array().unwrap().len(), 1);
        assert_eq!(uploaded[0]["ai_metadata"]["category"], "Lønnslipp");
        assert_eq!(uploaded[0]["ai_metadata"]["sensitive_data"], true);
        assert_eq!(uploaded[0]["ai_metadata"]["processing_status"], "failed");
        assert_eq!(uploaded[0]["original_name"], "lønnslipp.txt");
    }

    #[tokio::test]
    async fn partial_batch_returns_successes_and_errors() {
        let server = test_server();

        let form = MultipartForm::new()
            .add_part("files", text_part("hei", "notat.txt"))
            .add_part(
                "files",
                Part::bytes(vec![0u8; 8])
                    .file_name("virus.exe")
                    .mime_type("application/x-msdownload"),
            );
        let response = server.post("/api/files/upload").multipart(form).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["uploaded_files"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 1);
        assert!(body["data"]["message"]
            .as_str()
            .unwrap()
            .contains("(1 failed)"));
    }

    #[tokio::test]
    async fn fully_failing_batch_is_an_aggregate_error() {
        let server = test_server();

        let form = MultipartForm::new().add_part(
            "files",
            Part::bytes(vec![0u8; 8])
                .file_name("virus.exe")
                .mime_type("application/x-msdownload"),
        );
        let response = server.post("/api/files/upload").multipart(form).await;

        response.assert_status_internal_server_error();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "All uploads failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_upload_is_a_bad_request() {
        let server = test_server();

        let form = MultipartForm::new().add_text("note", "no file here");
        let response = server.post("/api/files/upload").multipart(form).await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn uploaded_files_show_up_in_the_listing() {
        let server = test_server();

        let form = MultipartForm::new().add_part("files", text_part("hei", "notat.txt"));
        server.post("/api/files/upload").multipart(form).await;

        let response = server.get("/api/files").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        let files = body["data"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(body["meta"]["total"], 1);
        assert!(files[0]["url"].as_str().unwrap().starts_with("https://minio.local/"));
    }
}
