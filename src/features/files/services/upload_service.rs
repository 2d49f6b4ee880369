//! Upload orchestrator.
//!
//! Per file: validate, write to the object store, classify (with guaranteed
//! fallback), persist. Files in a batch run independently and concurrently;
//! one file failing never touches its siblings. Stored blobs are not rolled
//! back when a later step fails; orphaned objects are an accepted cost.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::features::files::models::{FileRecord, ProcessingStatus};
use crate::features::files::repository::FileRepository;
use crate::features::files::services::{AnalysisOutcome, AnalysisService};
use crate::features::files::validation::{resolve_content_type, validate_upload};
use crate::modules::storage::ObjectStorage;
use crate::shared::constants::UploadPolicy;

lazy_static! {
    /// Characters allowed to survive in object keys
    static ref SAFE_NAME_RE: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

/// Length of the random object-key suffix
const KEY_SUFFIX_LEN: usize = 6;

/// One file of an upload batch, as read from the multipart body
#[derive(Debug, Clone)]
pub struct IncomingUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Result of one batch: per-file successes and failure reasons
#[derive(Debug)]
pub struct BatchOutcome {
    pub uploaded: Vec<FileRecord>,
    pub errors: Vec<String>,
}

impl BatchOutcome {
    /// A batch counts as failed only when nothing succeeded
    pub fn is_total_failure(&self) -> bool {
        self.uploaded.is_empty() && !self.errors.is_empty()
    }
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    repository: Arc<dyn FileRepository>,
    analysis: Arc<AnalysisService>,
    policy: Arc<UploadPolicy>,
    max_concurrent_files: usize,
    rng: Mutex<StdRng>,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        repository: Arc<dyn FileRepository>,
        analysis: Arc<AnalysisService>,
        policy: Arc<UploadPolicy>,
        max_concurrent_files: usize,
    ) -> Self {
        Self::with_rng(
            storage,
            repository,
            analysis,
            policy,
            max_concurrent_files,
            StdRng::from_os_rng(),
        )
    }

    /// Construct with a caller-provided RNG so tests can pin key suffixes
    pub fn with_rng(
        storage: Arc<dyn ObjectStorage>,
        repository: Arc<dyn FileRepository>,
        analysis: Arc<AnalysisService>,
        policy: Arc<UploadPolicy>,
        max_concurrent_files: usize,
        rng: StdRng,
    ) -> Self {
        Self {
            storage,
            repository,
            analysis,
            policy,
            max_concurrent_files: max_concurrent_files.max(1),
            rng: Mutex::new(rng),
        }
    }

    /// Run the per-file pipeline for a whole batch.
    ///
    /// Files are processed concurrently up to the configured bound; results
    /// land in one slot per input index, so output order matches input
    /// order regardless of completion order.
    pub async fn upload_batch(&self, owner_id: &str, files: Vec<IncomingUpload>) -> BatchOutcome {
        let total = files.len();

        let indexed_results: Vec<(usize, std::result::Result<FileRecord, String>)> =
            stream::iter(files.into_iter().enumerate())
                .map(|(index, file)| async move {
                    (index, self.process_file(owner_id, file).await)
                })
                .buffer_unordered(self.max_concurrent_files)
                .collect()
                .await;

        let mut slots: Vec<Option<std::result::Result<FileRecord, String>>> =
            (0..total).map(|_| None).collect();
        for (index, result) in indexed_results {
            slots[index] = Some(result);
        }

        let mut uploaded = Vec::new();
        let mut errors = Vec::new();
        for slot in slots.into_iter().flatten() {
            match slot {
                Ok(record) => uploaded.push(record),
                Err(reason) => errors.push(reason),
            }
        }

        info!(
            "Upload batch completed: {} successful, {} failed",
            uploaded.len(),
            errors.len()
        );

        BatchOutcome { uploaded, errors }
    }

    /// One file through the whole pipeline; errors are returned as
    /// user-facing reason strings, never propagated across file boundaries.
    async fn process_file(
        &self,
        owner_id: &str,
        file: IncomingUpload,
    ) -> std::result::Result<FileRecord, String> {
        // Received -> Validated
        validate_upload(
            &file.filename,
            &file.content_type,
            file.data.len(),
            &self.policy,
        )?;

        let content_type = resolve_content_type(&file.filename, &file.content_type, &self.policy);
        let checksum = hex::encode(Sha256::digest(&file.data));

        // Validated -> Stored
        let generated_name = self.generate_object_key(owner_id, &file.filename);
        let object_key = self
            .storage
            .put(&generated_name, file.data.clone(), &content_type)
            .await
            .map_err(|e| {
                warn!("Object-store write failed for {}: {}", file.filename, e);
                format!("Failed to upload {}: {}", file.filename, e)
            })?;

        debug!("Stored object for {}: {}", file.filename, object_key);

        // Stored -> Classified; this transition never aborts the file
        let analysis = match self
            .analysis
            .analyze_with_fallback(&file.data, &file.filename, &content_type)
            .await
        {
            AnalysisOutcome::Ai(analysis) => analysis,
            AnalysisOutcome::Fallback(mut analysis) => {
                // Distinguish fallback metadata for downstream consumers
                analysis.processing_status = ProcessingStatus::Failed;
                analysis
            }
        };

        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            original_name: file.filename.clone(),
            generated_name: generated_name.clone(),
            object_key,
            content_type,
            size: file.data.len() as i64,
            checksum,
            analysis,
            uploaded_at: Utc::now(),
        };

        // Classified -> Persisted; the stored blob stays put on failure
        self.repository.insert(&record).await.map_err(|e| {
            warn!(
                "Persistence failed for {} (orphaned object {}): {}",
                file.filename, generated_name, e
            );
            format!("Failed to process {}: {}", file.filename, e)
        })?;

        info!(
            "File persisted: id={}, key={}, category={}, status={}",
            record.id,
            record.object_key,
            record.analysis.category,
            record.analysis.processing_status.as_str()
        );

        Ok(record)
    }

    /// Owner-scoped, collision-resistant object key:
    /// `{owner}/{unix-millis}-{random suffix}-{sanitized name}`
    fn generate_object_key(&self, owner_id: &str, filename: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let suffix: String = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            (0..KEY_SUFFIX_LEN)
                .map(|_| rng.sample(Alphanumeric) as char)
                .collect::<String>()
                .to_lowercase()
        };
        let safe_name = SAFE_NAME_RE.replace_all(filename, "_");

        format!("{}/{}-{}-{}", owner_id, timestamp, suffix, safe_name)
    }
}
