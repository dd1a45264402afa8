use std::convert::Infallible;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, LengthLimitError};
use hyper::{Request, Response, StatusCode, header};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared::types::upload::{UploadResponse, is_safe_file_name};

use crate::handlers::http::utils::{self, CacheStrategy};
use crate::{AppState, ReqBody};

type HttpResult = Result<Response<BoxBody<Bytes, Infallible>>>;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Extension used when the client sends none we can keep.
const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("expected a multipart/form-data body")]
    NotMultipart,

    #[error("no file uploaded")]
    MissingFile,

    #[error("only image files are allowed")]
    NotAnImage,

    #[error("upload exceeds the configured limit")]
    TooLarge,

    #[error("malformed multipart body: {0}")]
    Multipart(multer::Error),
}

impl From<multer::Error> for UploadError {
    fn from(e: multer::Error) -> Self {
        match &e {
            multer::Error::StreamReadFailed(inner) if inner.is::<LengthLimitError>() => {
                UploadError::TooLarge
            }
            _ => UploadError::Multipart(e),
        }
    }
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            UploadError::NotMultipart => "NOT_MULTIPART",
            UploadError::MissingFile => "MISSING_FILE",
            UploadError::NotAnImage => "INVALID_FILE_TYPE",
            UploadError::TooLarge => "PAYLOAD_TOO_LARGE",
            UploadError::Multipart(_) => "MALFORMED_BODY",
        }
    }
}

/// An image pulled out of the form, not yet written.
#[derive(Debug)]
pub struct ReceivedImage {
    pub original_name: Option<String>,
    pub data: Bytes,
}

/// Lowercased ASCII-alphanumeric extension of `original`, or `bin`.
pub fn sanitize_extension(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .take(MAX_EXTENSION_LEN)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    if ext.is_empty() {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}

/// Fresh collision-free name for a stored upload.
pub fn generate_file_name(original: Option<&str>) -> String {
    format!("{}.{}", Uuid::new_v4(), sanitize_extension(original))
}

/// Read the multipart body until the `file` field, which must be an image.
async fn receive_image(req: Request<ReqBody>) -> Result<ReceivedImage, UploadError> {
    let boundary = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::NotMultipart)?;

    let stream = req.into_body().into_data_stream();
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let is_image = field
            .content_type()
            .map(|m| m.essence_str().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(UploadError::NotAnImage);
        }

        let original_name = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        return Ok(ReceivedImage {
            original_name,
            data,
        });
    }

    Err(UploadError::MissingFile)
}

/// Write `data` under `dir`, creating the directory on demand.
pub async fn store_upload(dir: &Path, file_name: &str, data: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create uploads dir {}", dir.display()))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;
    Ok(path)
}

/// `POST /api/upload`.
pub async fn handle_upload(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let image = match receive_image(req).await {
        Ok(image) => image,
        Err(e) => {
            warn!("Upload rejected: {}", e);
            return utils::deliver_error_json(e.code(), &upload_message(&e), e.status());
        }
    };

    let uploads_dir = state.config.read().await.paths.uploads_dir.clone();
    let file_name = generate_file_name(image.original_name.as_deref());
    let path = store_upload(Path::new(&uploads_dir), &file_name, &image.data).await?;

    info!("Stored upload {} ({} bytes)", path.display(), image.data.len());
    utils::deliver_serialized_json(&UploadResponse::for_file(&file_name), StatusCode::OK)
}

fn upload_message(e: &UploadError) -> String {
    match e {
        UploadError::MissingFile => "No file uploaded".to_string(),
        UploadError::NotAnImage => "Only image files are allowed".to_string(),
        UploadError::Multipart(_) => "Malformed multipart body".to_string(),
        other => other.to_string(),
    }
}

/// `GET /api/uploads/:filename`. Stored names never change, so responses
/// are cached as immutable.
pub async fn handle_get_upload(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let name = req
        .uri()
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    if !is_safe_file_name(&name) {
        warn!("Rejected upload name: {:?}", name);
        return utils::not_found("File not found");
    }

    let uploads_dir = state.config.read().await.paths.uploads_dir.clone();
    let path = Path::new(&uploads_dir).join(&name);

    match utils::deliver_file(
        &path,
        upload_mime_type(&path),
        StatusCode::OK,
        CacheStrategy::Immutable,
    )
    .await
    .context("Failed to read upload")?
    {
        Some(response) => Ok(response),
        None => utils::not_found("File not found"),
    }
}

/// Uploads are only ever served as images. Anything else goes out as an
/// opaque download so a stored file can never render as a page.
pub fn upload_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
