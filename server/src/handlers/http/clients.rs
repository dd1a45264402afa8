use std::convert::Infallible;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::client::ClientInput;
use shared::types::upload::stored_file_name;

use crate::database::clients as store;
use crate::handlers::http::blog::body_error;
use crate::handlers::http::routes::path_id;
use crate::handlers::http::utils;
use crate::{AppState, ReqBody};

type HttpResult = Result<Response<BoxBody<Bytes, Infallible>>>;

/// Segment holding the id in `/api/clients/:id`.
const ID_SEGMENT: usize = 3;

const CLIENT_NOT_FOUND: &str = "Client not found";

/// `GET /api/clients[?all=true]`
pub async fn handle_list(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let include_inactive = utils::get_query_param(&req, "all").as_deref() == Some("true");
    let clients = store::list_clients(&state.db, include_inactive)
        .await
        .context("Failed to list clients")?;
    utils::deliver_serialized_json(&clients, StatusCode::OK)
}

/// `POST /api/clients`. New clients are always active.
pub async fn handle_create(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let mut input: ClientInput = match utils::read_json(req).await {
        Ok(input) => input,
        Err(e) => return body_error(e),
    };
    input.active = None;

    let Some(fields) = input.into_fields() else {
        return utils::bad_request("Name and logo are required");
    };

    let client = store::create_client(&state.db, fields)
        .await
        .context("Failed to create client")?;

    info!("Created client {} ({})", client.id, client.name);
    utils::deliver_serialized_json(&client, StatusCode::OK)
}

/// `PUT /api/clients/:id`
pub async fn handle_update(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let Some(id) = path_id(&req, ID_SEGMENT) else {
        return utils::bad_request("Invalid client id");
    };

    let input: ClientInput = match utils::read_json(req).await {
        Ok(input) => input,
        Err(e) => return body_error(e),
    };

    let Some(fields) = input.into_fields() else {
        return utils::bad_request("Name and logo are required");
    };

    match store::update_client(&state.db, id, fields)
        .await
        .context("Failed to update client")?
    {
        Some(client) => {
            info!("Updated client {}", id);
            utils::deliver_serialized_json(&client, StatusCode::OK)
        }
        None => utils::not_found(CLIENT_NOT_FOUND),
    }
}

/// `DELETE /api/clients?id=N` or `DELETE /api/clients/:id`. A logo stored in
/// the upload directory goes with the client.
pub async fn handle_delete(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let id = path_id(&req, ID_SEGMENT).or_else(|| {
        utils::get_query_param(&req, "id").and_then(|v| v.trim().parse::<i64>().ok())
    });
    let Some(id) = id else {
        return utils::bad_request("Client ID is required");
    };

    let Some(removed) = store::delete_client(&state.db, id)
        .await
        .context("Failed to delete client")?
    else {
        return utils::not_found(CLIENT_NOT_FOUND);
    };

    if let Some(file_name) = stored_file_name(&removed.logo) {
        let uploads_dir = state.config.read().await.paths.uploads_dir.clone();
        remove_logo(&Path::new(&uploads_dir).join(file_name)).await;
    }

    info!("Deleted client {} ({})", id, removed.name);
    utils::deliver_success_json()
}

/// Best effort: the client row is already gone.
async fn remove_logo(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Removed logo file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Logo file already missing: {}", path.display())
        }
        Err(e) => warn!("Failed to remove logo file {}: {}", path.display(), e),
    }
}
