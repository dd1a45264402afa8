use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError};
use hyper::Request;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::ReqBody;

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("request body exceeds the configured limit")]
    TooLarge,

    #[error("failed to read request body: {0}")]
    Read(String),

    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl BodyError {
    /// `TooLarge` when the size limit tripped, `Read` otherwise.
    fn from_boxed(e: crate::BoxError) -> Self {
        if e.is::<LengthLimitError>() {
            BodyError::TooLarge
        } else {
            BodyError::Read(e.to_string())
        }
    }
}

/// Collect the whole body.
pub async fn read_body(req: Request<ReqBody>) -> Result<Bytes, BodyError> {
    req.into_body()
        .collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(BodyError::from_boxed)
}

/// Collect the body and parse it as JSON.
pub async fn read_json<T: DeserializeOwned>(req: Request<ReqBody>) -> Result<T, BodyError> {
    let bytes = read_body(req).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
