use std::convert::Infallible;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{info, warn};

use shared::types::blog::BlogPostInput;

use crate::database::{blog as posts, utils::today_string};
use crate::handlers::http::routes::path_id;
use crate::handlers::http::utils::{self, BodyError};
use crate::{AppState, ReqBody};

type HttpResult = Result<Response<BoxBody<Bytes, Infallible>>>;

/// Segment holding the id in `/api/blog/:id`.
const ID_SEGMENT: usize = 3;

const POST_NOT_FOUND: &str = "Post not found";

/// `GET /api/blog`, newest first.
pub async fn handle_list(_req: Request<ReqBody>, state: AppState) -> HttpResult {
    let all = posts::list_posts(&state.db)
        .await
        .context("Failed to list blog posts")?;
    utils::deliver_serialized_json(&all, StatusCode::OK)
}

pub async fn handle_get(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let Some(id) = path_id(&req, ID_SEGMENT) else {
        return utils::bad_request("Invalid post id");
    };

    match posts::get_post(&state.db, id)
        .await
        .context("Failed to load blog post")?
    {
        Some(post) => utils::deliver_serialized_json(&post, StatusCode::OK),
        None => utils::not_found(POST_NOT_FOUND),
    }
}

/// `POST /api/blog`. Title and content are required.
pub async fn handle_create(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let input: BlogPostInput = match utils::read_json(req).await {
        Ok(input) => input,
        Err(e) => return body_error(e),
    };

    let Some(new_post) = input.into_new_post(&today_string()) else {
        return utils::bad_request("Title and content are required");
    };

    let post = posts::create_post(&state.db, new_post)
        .await
        .context("Failed to create blog post")?;

    info!("Created blog post {} ({})", post.id, post.title);
    utils::deliver_serialized_json(&post, StatusCode::CREATED)
}

/// `PUT /api/blog/:id`. Partial update merged over the stored post.
pub async fn handle_update(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let Some(id) = path_id(&req, ID_SEGMENT) else {
        return utils::bad_request("Invalid post id");
    };

    let input: BlogPostInput = match utils::read_json(req).await {
        Ok(input) => input,
        Err(e) => return body_error(e),
    };

    let Some(existing) = posts::get_post(&state.db, id)
        .await
        .context("Failed to load blog post")?
    else {
        return utils::not_found(POST_NOT_FOUND);
    };

    let merged = input.apply_to(&existing, &today_string());
    match posts::update_post(&state.db, id, merged)
        .await
        .context("Failed to update blog post")?
    {
        Some(post) => {
            info!("Updated blog post {}", id);
            utils::deliver_serialized_json(&post, StatusCode::OK)
        }
        None => utils::not_found(POST_NOT_FOUND),
    }
}

pub async fn handle_delete(req: Request<ReqBody>, state: AppState) -> HttpResult {
    let Some(id) = path_id(&req, ID_SEGMENT) else {
        return utils::bad_request("Invalid post id");
    };

    if posts::delete_post(&state.db, id)
        .await
        .context("Failed to delete blog post")?
    {
        info!("Deleted blog post {}", id);
        utils::deliver_success_json()
    } else {
        utils::not_found(POST_NOT_FOUND)
    }
}

/// Response for a body that could not be read or parsed.
pub(crate) fn body_error(e: BodyError) -> HttpResult {
    match e {
        BodyError::TooLarge => utils::deliver_error_json(
            "PAYLOAD_TOO_LARGE",
            "Request body too large",
            StatusCode::PAYLOAD_TOO_LARGE,
        ),
        other => {
            warn!("Rejected request body: {}", other);
            utils::bad_request("Invalid JSON body")
        }
    }
}
