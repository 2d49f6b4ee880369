use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileListQuery, FileResponseDto, FileUrlResponseDto,
};
use crate::features::files::repository::FileListFilter;
use crate::features::files::routes::FilesState;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's documents
///
/// Newest first; optionally narrowed by category and/or tag. Each entry
/// carries a presigned download URL.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(FileListQuery),
    responses(
        (status = 200, description = "Documents owned by the caller", body = ApiResponse<Vec<FileResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponseDto>>>, AppError> {
    let filter = FileListFilter {
        category: query.category.filter(|c| !c.is_empty()),
        tag: query.tag.filter(|t| !t.is_empty()),
    };

    let entries = state.file_service.list_files(&user.user_id, &filter).await?;

    let total = entries.len() as i64;
    let files: Vec<FileResponseDto> = entries
        .into_iter()
        .map(|entry| FileResponseDto::from_record(entry.record, entry.url))
        .collect();

    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Presigned download URL for one document
///
/// Only the owner can request a URL; the link expires after the configured
/// TTL.
#[utoipa::path(
    get,
    path = "/api/files/{id}/url",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File record id")
    ),
    responses(
        (status = 200, description = "Temporary download URL", body = ApiResponse<FileUrlResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file_url(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileUrlResponseDto>>, AppError> {
    let (url, expires_in) = state.file_service.get_download_url(&user.user_id, id).await?;

    Ok(Json(ApiResponse::success(
        Some(FileUrlResponseDto { url, expires_in }),
        None,
        None,
    )))
}

/// Delete a document
///
/// Only the owner can delete. The stored object is removed best-effort;
/// the metadata row is removed regardless.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = Uuid, Path, description = "File record id")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    state.file_service.delete_file(&user.user_id, id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}
