use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};

use shared::types::session::SessionStatus;

use crate::handlers::http::utils;
use crate::{AppState, ReqBody};

/// `GET /api/auth`: whether the caller holds a valid session. Never 401.
pub async fn handle_status(
    req: Request<ReqBody>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let status = utils::get_cookie(req.headers(), &state.session.cookie_name)
        .and_then(|token| state.tokens.principal_of(&token))
        .map(|principal| SessionStatus::for_principal(&principal))
        .unwrap_or_else(SessionStatus::anonymous);

    let response = utils::deliver_serialized_json(&status, StatusCode::OK)?;
    Ok(utils::add_no_cache_headers(response))
}
