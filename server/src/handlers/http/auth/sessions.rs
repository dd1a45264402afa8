use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use shared::types::session::{SessionInfo, TokenPayload};

use crate::handlers::http::utils;
use crate::security::token::unix_now;
use crate::{AppState, ReqBody};

#[derive(Serialize)]
struct SessionInfoResponse {
    success: bool,
    data: SessionInfo,
}

/// `GET /api/auth/sessions`: details of the caller's session plus the
/// recent-login audit. The router has already verified `payload`.
pub async fn handle_session_info(
    _req: Request<ReqBody>,
    state: AppState,
    payload: TokenPayload,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let recent = state.audit.snapshot_at(unix_now()).await;
    debug!("Session info requested, {} audited sessions", recent.len());

    let expires_at = payload
        .expires_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    let body = SessionInfoResponse {
        success: true,
        data: SessionInfo {
            user_id: payload.user_id,
            expires_at,
            session_type: "JWT".to_string(),
            active_sessions: recent.len(),
            recent,
        },
    };

    let response = utils::deliver_serialized_json(&body, StatusCode::OK)?;
    Ok(utils::add_no_cache_headers(response))
}
