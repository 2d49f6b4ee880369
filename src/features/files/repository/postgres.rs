use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::files::models::{
    DocumentAnalysis, DocumentLanguage, FileRecord, ProcessingStatus,
};
use crate::features::files::repository::{FileListFilter, FileRepository};

const SELECT_COLUMNS: &str = "SELECT id, owner_id, original_name, generated_name, object_key, \
     content_type, size, checksum, category, is_custom_category, tags, \
     sensitive_data, sensitive_data_tags, confidence, language, description, \
     ai_name, processing_status, last_analyzed, uploaded_at FROM files";

/// Database row; enum columns are stored as text
#[derive(Debug, FromRow)]
struct FileRow {
    id: Uuid,
    owner_id: String,
    original_name: String,
    generated_name: String,
    object_key: String,
    content_type: String,
    size: i64,
    checksum: String,
    category: String,
    is_custom_category: bool,
    tags: Vec<String>,
    sensitive_data: bool,
    sensitive_data_tags: Vec<String>,
    confidence: f64,
    language: String,
    description: String,
    ai_name: String,
    processing_status: String,
    last_analyzed: DateTime<Utc>,
    uploaded_at: DateTime<Utc>,
}

impl From<FileRow> for FileRecord {
    fn from(row: FileRow) -> Self {
        FileRecord {
            id: row.id,
            owner_id: row.owner_id,
            original_name: row.original_name,
            generated_name: row.generated_name,
            object_key: row.object_key,
            content_type: row.content_type,
            size: row.size,
            checksum: row.checksum,
            analysis: DocumentAnalysis {
                category: row.category,
                is_custom_category: row.is_custom_category,
                tags: row.tags,
                sensitive_data: row.sensitive_data,
                sensitive_data_tags: row.sensitive_data_tags,
                confidence: row.confidence,
                language: DocumentLanguage::parse(&row.language),
                description: row.description,
                ai_name: row.ai_name,
                processing_status: ProcessingStatus::parse(&row.processing_status),
                last_analyzed: row.last_analyzed,
            },
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Postgres-backed file store
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn insert(&self, record: &FileRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO files (
                id, owner_id, original_name, generated_name, object_key,
                content_type, size, checksum, category, is_custom_category,
                tags, sensitive_data, sensitive_data_tags, confidence,
                language, description, ai_name, processing_status,
                last_analyzed, uploaded_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(&record.original_name)
        .bind(&record.generated_name)
        .bind(&record.object_key)
        .bind(&record.content_type)
        .bind(record.size)
        .bind(&record.checksum)
        .bind(&record.analysis.category)
        .bind(record.analysis.is_custom_category)
        .bind(&record.analysis.tags)
        .bind(record.analysis.sensitive_data)
        .bind(&record.analysis.sensitive_data_tags)
        .bind(record.analysis.confidence)
        .bind(record.analysis.language.as_str())
        .bind(&record.analysis.description)
        .bind(&record.analysis.ai_name)
        .bind(record.analysis.processing_status.as_str())
        .bind(record.analysis.last_analyzed)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        filter: &FileListFilter,
    ) -> Result<Vec<FileRecord>> {
        let mut query = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE owner_id = ").push_bind(owner_id);

        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(tag) = &filter.tag {
            query.push(" AND ").push_bind(tag).push(" = ANY(tags)");
        }

        query.push(" ORDER BY uploaded_at DESC");

        let rows: Vec<FileRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<FileRecord>> {
        let row: Option<FileRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 AND owner_id = $2", SELECT_COLUMNS))
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(FileRecord::from))
    }

    async fn delete_by_id(&self, id: Uuid, owner_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
