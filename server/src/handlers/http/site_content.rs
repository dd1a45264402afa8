use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use tracing::{error, info};

use shared::types::site_content::{HOME_KEY, HomePageContent};

use crate::database::site_content as store;
use crate::handlers::http::blog::body_error;
use crate::handlers::http::utils;
use crate::{AppState, ReqBody};

type HttpResult = Result<Response<BoxBody<Bytes, Infallible>>>;

/// `GET /api/site-content/home`. Falls back to the built-in copy when
/// nothing valid is stored or the read fails.
pub async fn handle_get_home(_req: Request<ReqBody>, state: AppState) -> HttpResult {
    let stored = match store::get_content(&state.db, HOME_KEY).await {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to read home page content: {}", e);
            None
        }
    };

    let content = stored
        .and_then(HomePageContent::from_value)
        .unwrap_or_default();

    utils::deliver_serialized_json(&content, StatusCode::OK)
}

/// `PUT /api/site-content/home`
pub async fn handle_put_home(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let value: Value = match utils::read_json(req).await {
        Ok(value) => value,
        Err(e) => return body_error(e),
    };

    let Some(content) = HomePageContent::from_value(value) else {
        return utils::bad_request("Invalid payload");
    };

    let normalized = serde_json::to_value(&content).context("Failed to encode home content")?;
    store::put_content(&state.db, HOME_KEY, &normalized)
        .await
        .context("Failed to store home page content")?;

    info!("Home page content updated");
    utils::deliver_success_json()
}
