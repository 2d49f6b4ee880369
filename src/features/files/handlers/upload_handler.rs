use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::debug;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{FileResponseDto, UploadBatchDto, UploadBatchResponseDto};
use crate::features::files::routes::FilesState;
use crate::features::files::services::IncomingUpload;
use crate::shared::types::ApiResponse;

/// Upload a batch of documents
///
/// Accepts multipart/form-data with one or more `files` fields. Every file
/// runs the full pipeline independently: validation, object-store write,
/// AI classification (with local fallback), persistence. The response
/// enumerates successes and per-file failures; the request only fails as a
/// whole when no file made it through.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadBatchDto,
        content_type = "multipart/form-data",
        description = "One or more files under repeated `files` fields",
    ),
    responses(
        (status = 200, description = "Batch processed; response lists successes and per-file errors", body = ApiResponse<UploadBatchResponseDto>),
        (status = 400, description = "No files provided or malformed multipart body"),
        (status = 401, description = "Authentication required"),
        (status = 500, description = "Every file in the batch failed")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_files(
    user: AuthenticatedUser,
    State(state): State<FilesState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadBatchResponseDto>>, AppError> {
    let mut files: Vec<IncomingUpload> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" | "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(IncomingUpload {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let outcome = state
        .upload_service
        .upload_batch(&user.user_id, files)
        .await;

    if outcome.is_total_failure() {
        return Err(AppError::BatchFailed(outcome.errors));
    }

    let failed = outcome.errors.len();
    let message = if failed > 0 {
        format!(
            "Successfully uploaded {} file(s) ({} failed)",
            outcome.uploaded.len(),
            failed
        )
    } else {
        format!("Successfully uploaded {} file(s)", outcome.uploaded.len())
    };

    let response = UploadBatchResponseDto {
        uploaded_files: outcome
            .uploaded
            .into_iter()
            .map(|record| FileResponseDto::from_record(record, None))
            .collect(),
        errors: (!outcome.errors.is_empty()).then_some(outcome.errors),
        message,
    };

    Ok(Json(ApiResponse::success(Some(response), None, None)))
}
