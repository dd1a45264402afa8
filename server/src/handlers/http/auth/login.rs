use std::convert::Infallible;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode, header};
use tracing::{error, info, warn};

use shared::types::login::{LoginData, LoginError, LoginResponse};
use shared::types::session::ADMIN_PRINCIPAL;

use crate::handlers::http::utils::{self, BodyError};
use crate::{AppState, ReqBody};

/// Main login handler
pub async fn handle_login(
    req: Request<ReqBody>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    info!("Processing login request");

    let secure = utils::secure_cookies(&req, state.session.secure_cookies);

    // Parse login body
    let login_data: LoginData = match utils::read_json(req).await {
        Ok(data) => data,
        Err(BodyError::TooLarge) => {
            return utils::deliver_error_json(
                "PAYLOAD_TOO_LARGE",
                "Request body too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            );
        }
        Err(e) => {
            warn!("Login parsing failed: {}", e);
            return deliver_login_error(LoginError::MalformedBody, StatusCode::BAD_REQUEST);
        }
    };

    // Validate input
    if login_data.password.is_empty() {
        return deliver_login_error(
            LoginError::MissingField("password".to_string()),
            StatusCode::BAD_REQUEST,
        );
    }

    if !state.admin.matches(&login_data.password) {
        warn!("Login failed: {}", LoginError::InvalidCredentials.to_code());
        return deliver_login_error(LoginError::InvalidCredentials, StatusCode::UNAUTHORIZED);
    }

    let hours = state.session.lifetime_hours;
    let (token, payload) = match state.tokens.mint(ADMIN_PRINCIPAL, hours) {
        Ok(issued) => issued,
        Err(e) => {
            error!("Failed to issue session token: {}", e);
            return deliver_login_error(
                LoginError::InternalError,
                StatusCode::INTERNAL_SERVER_ERROR,
            );
        }
    };

    state.audit.record(&token, &payload).await;

    let lifetime = Duration::from_secs(hours.saturating_mul(3600));
    let cookie =
        utils::create_session_cookie(&state.session.cookie_name, &token, lifetime, secure)
            .context("Failed to create session cookie")?;

    info!("Admin logged in, session valid until {}", payload.exp);

    let mut response = utils::deliver_serialized_json(&LoginResponse::success(), StatusCode::OK)?;
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

fn deliver_login_error(
    login_error: LoginError,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    utils::deliver_serialized_json(&login_error.to_response(), status)
}
