use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, header};
use tracing::info;

use crate::handlers::http::utils;
use crate::{AppState, ReqBody};

/// Clear the session cookie. Always succeeds, with or without a session.
pub async fn handle_logout(
    req: Request<ReqBody>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    logout_with(req, state, None).await
}

/// Admin-tier logout from the session info endpoint.
pub async fn handle_session_logout(
    req: Request<ReqBody>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    logout_with(req, state, Some("Logged out successfully")).await
}

async fn logout_with(
    req: Request<ReqBody>,
    state: AppState,
    message: Option<&str>,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let secure = utils::secure_cookies(&req, state.session.secure_cookies);
    let cookie = utils::delete_cookie(&state.session.cookie_name, secure)
        .context("Failed to build logout cookie")?;

    info!("Admin logged out");

    let mut response = match message {
        Some(m) => utils::deliver_success_message(m)?,
        None => utils::deliver_success_json()?,
    };
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}
