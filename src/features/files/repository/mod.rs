//! Persistence capability for file records.

pub mod postgres;

pub use postgres::PgFileRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::FileRecord;

/// Optional narrowing of a listing; both filters may combine
#[derive(Debug, Clone, Default)]
pub struct FileListFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
}

/// Owner-scoped document-record store.
///
/// Every read and mutation is keyed by owner as well as id, so ownership
/// checks cannot be forgotten at call sites.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Persist a fully-built record
    async fn insert(&self, record: &FileRecord) -> Result<()>;

    /// All records for `owner_id`, newest first
    async fn list_by_owner(
        &self,
        owner_id: &str,
        filter: &FileListFilter,
    ) -> Result<Vec<FileRecord>>;

    /// Record by id, only if owned by `owner_id`
    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<FileRecord>>;

    /// Delete by id, only if owned by `owner_id`; returns whether a row
    /// was removed
    async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<bool>;
}
