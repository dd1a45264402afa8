use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full, combinators::BoxBody};
use hyper::{Response, StatusCode, header};
use std::convert::Infallible;
use tracing::debug;

use crate::handlers::http::utils::headers;

#[derive(Debug, Clone, Copy)]
pub enum CacheStrategy {
    Yes,       // Default (1 year)
    Explicit,  // No cache at all
    Immutable, // 1 year, never revalidated
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Yes => write!(f, "Yes (1 year)"),
            CacheStrategy::Explicit => write!(f, "Explicit (no-cache)"),
            CacheStrategy::Immutable => write!(f, "Immutable (1 year)"),
        }
    }
}

/// Read an HTML file from disk and deliver it uncached.
/// `None` when the file does not exist.
pub async fn deliver_html_page<P: AsRef<Path>>(
    file_path: P,
) -> Result<Option<Response<BoxBody<Bytes, Infallible>>>> {
    deliver_page_with_status(file_path, StatusCode::OK, CacheStrategy::Explicit).await
}

/// Deliver a file with caching headers, typed by its extension.
pub async fn deliver_page_with_status<P: AsRef<Path>>(
    file_path: P,
    status: StatusCode,
    cache: CacheStrategy,
) -> Result<Option<Response<BoxBody<Bytes, Infallible>>>> {
    let path = file_path.as_ref();
    deliver_file(path, get_mime_type(path), status, cache).await
}

/// Deliver a file with an explicit content type.
/// This is the core function that handles all file-based deliveries.
///
/// A missing file is `Ok(None)` so callers can answer 404; any other read
/// failure is an error.
pub async fn deliver_file(
    path: &Path,
    mime_type: &'static str,
    status: StatusCode,
    cache: CacheStrategy,
) -> Result<Option<Response<BoxBody<Bytes, Infallible>>>> {

    debug!("Reading file from: {} (cache: {})", path.display(), cache);

    let content = match tokio::fs::read(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::IsADirectory => {
            debug!("File not found: {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read file: {}", path.display()));
        }
    };

    let content_bytes = Bytes::from(content);

    debug!(
        "Delivering file with status: {}, size: {} bytes, mime: {}, cache: {}",
        status,
        content_bytes.len(),
        mime_type,
        cache
    );

    let response: Response<BoxBody<Bytes, Infallible>> = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime_type)
        .body(full(content_bytes))
        .map_err(|e| anyhow!("Failed to build response: {}", e))?;

    let response_with_cache = match cache {
        CacheStrategy::Yes => headers::add_cache_headers_with_max_age(response, None),
        CacheStrategy::Explicit => headers::add_no_cache_headers(response),
        CacheStrategy::Immutable => headers::add_immutable_cache_headers(response),
    };
    Ok(Some(response_with_cache))
}

/// Helper function to determine MIME type from file extension
pub fn get_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    match ext.as_deref() {
        // Web documents
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",

        // Images
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("txt") => "text/plain; charset=utf-8",

        // Default
        _ => "application/octet-stream",
    }
}

/// Helper function to create an empty body
pub fn empty() -> BoxBody<Bytes, Infallible> {
    Empty::<Bytes>::new().boxed()
}

/// Helper function to create a full body from various types
pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    let bytes: Bytes = chunk.into();
    let full_body: Full<Bytes> = Full::new(bytes);
    full_body.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_for_site_assets() {
        assert_eq!(get_mime_type(Path::new("a/index.html")), "text/html; charset=utf-8");
        assert_eq!(get_mime_type(Path::new("x.PNG")), "image/png");
        assert_eq!(get_mime_type(Path::new("x.jpeg")), "image/jpeg");
        assert_eq!(get_mime_type(Path::new("x.unknown")), "application/octet-stream");
        assert_eq!(get_mime_type(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let res = deliver_html_page(dir.path().join("nope.html")).await.unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn existing_file_is_served_with_cache_policy() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("logo.png");
        std::fs::write(&file, b"\x89PNG").unwrap();

        let res = deliver_page_with_status(&file, StatusCode::OK, CacheStrategy::Immutable)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        assert!(
            res.headers()["cache-control"]
                .to_str()
                .unwrap()
                .contains("immutable")
        );
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"\x89PNG");
    }
}
