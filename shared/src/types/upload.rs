use serde::{Deserialize, Serialize};

/// URL prefix under which stored uploads are served.
pub const UPLOADS_URL_PREFIX: &str = "/api/uploads/";

/// `POST /api/upload` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_url: String,
}

impl UploadResponse {
    pub fn for_file(file_name: &str) -> Self {
        Self {
            success: true,
            file_url: format!("{}{}", UPLOADS_URL_PREFIX, file_name),
        }
    }
}

/// A stored file name is a single path component: no separators, no
/// parent references, no hidden files.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// When `url` points into the upload store, the stored file name.
///
/// Accepts the canonical `/api/uploads/<name>` form and the older
/// `/uploads/<name>` form used by imported logos.
pub fn stored_file_name(url: &str) -> Option<&str> {
    let idx = url.find("/uploads/")?;
    let name = &url[idx + "/uploads/".len()..];
    let name = name.split(['?', '#']).next().unwrap_or(name);
    is_safe_file_name(name).then_some(name)
}
