use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_handler::upload_files,
        files_handlers::file_handler::list_files,
        files_handlers::file_handler::get_file_url,
        files_handlers::file_handler::delete_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Files
            files_models::file::ProcessingStatus,
            files_models::file::DocumentLanguage,
            files_models::file::DocumentAnalysis,
            files_dtos::UploadBatchDto,
            files_dtos::FileResponseDto,
            files_dtos::UploadBatchResponseDto,
            files_dtos::FileUrlResponseDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::UploadBatchResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::FileUrlResponseDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
        )
    ),
    tags(
        (name = "files", description = "Document upload, classification, and management"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Dokvault API",
        version = "0.1.0",
        description = "API documentation for Dokvault",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
