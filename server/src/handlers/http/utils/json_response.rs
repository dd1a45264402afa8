use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use std::convert::Infallible;
use tracing::{debug, error, warn};

use shared::types::json_error::{ErrorResponse, SuccessResponse};

use crate::handlers::http::utils::deliver_page::full;

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(json))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))?;

    Ok(response)
}

/// Delivers a JSON error body `{"error": message, "code": error_code}`.
pub fn deliver_error_json(
    error_code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    if status.is_server_error() {
        error!("Delivering error JSON: {} - {} ({})", status.as_u16(), error_code, message);
    } else {
        warn!("Delivering error JSON: {} - {} ({})", status.as_u16(), error_code, message);
    }

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// `{"success": true}`
pub fn deliver_success_json() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_serialized_json(&SuccessResponse::ok(), StatusCode::OK)
}

/// `{"success": true, "message": ...}`
pub fn deliver_success_message(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_serialized_json(&SuccessResponse::with_message(message), StatusCode::OK)
}

pub fn bad_request(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_error_json("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
}

pub fn not_found(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_error_json("NOT_FOUND", message, StatusCode::NOT_FOUND)
}

/// Last-resort 500 body. Built without any fallible step so it can be used
/// when a handler has already failed.
pub fn internal_error() -> Response<BoxBody<Bytes, Infallible>> {
    let body = serde_json::to_vec(&ErrorResponse::new("INTERNAL_ERROR", "Internal server error"))
        .unwrap_or_default();
    let mut res = Response::new(full(body));
    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    res
}
