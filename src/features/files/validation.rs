//! Upload acceptance checks. Pure functions over the injected policy; no
//! I/O happens here.

use crate::shared::constants::UploadPolicy;

/// Check a declared file against the allow-list and size ceiling.
///
/// A file is accepted when EITHER its MIME type or its filename extension
/// matches the policy; both have to miss for a rejection. The returned
/// `Err` carries the user-facing reason.
pub fn validate_upload(
    filename: &str,
    content_type: &str,
    size: usize,
    policy: &UploadPolicy,
) -> Result<(), String> {
    let name_lower = filename.to_lowercase();

    let mime_matches = policy
        .accepted_types
        .iter()
        .any(|(mime, _)| *mime == content_type);

    let extension_matches = policy
        .accepted_types
        .iter()
        .flat_map(|(_, extensions)| extensions.iter())
        .any(|ext| name_lower.ends_with(ext));

    if !mime_matches && !extension_matches {
        return Err(format!(
            "File \"{}\" is not a supported format. Please upload PDF, DOC, \
             images (PNG, JPG, GIF, WebP), or text files (TXT, MD) only.",
            filename
        ));
    }

    if size > policy.max_file_size {
        return Err(format!(
            "File \"{}\" is too large. Maximum size is {}MB.",
            filename,
            policy.max_file_size / 1024 / 1024
        ));
    }

    Ok(())
}

/// Resolve the content type actually used for storage and classification.
///
/// Browsers occasionally send an empty or generic type; fall back to the
/// extension in that case.
pub fn resolve_content_type(filename: &str, declared: &str, policy: &UploadPolicy) -> String {
    if !declared.is_empty() && declared != "application/octet-stream" {
        return declared.to_string();
    }

    let name_lower = filename.to_lowercase();
    for (mime, extensions) in policy.accepted_types {
        if extensions.iter().any(|ext| name_lower.ends_with(ext)) {
            return (*mime).to_string();
        }
    }

    "application/octet-stream".to_string()
}
