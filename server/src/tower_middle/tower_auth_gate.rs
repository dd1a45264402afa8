use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tower::{Layer, Service};
use tracing::{debug, warn};

use shared::types::json_error::ErrorResponse;

use crate::handlers::http::utils::{empty, full, get_cookie};
use crate::security::SessionTokenService;

/// Login page, the one admin path reachable without a session.
pub const LOGIN_PATH: &str = "/admin/login";

/// How a path is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// Not gated.
    Open,
    /// Admin UI page: send the browser to the login page.
    AdminPage,
    /// API call: 401 with a JSON body.
    Api,
}

/// `path` is `root` itself or lies underneath it. `/api/uploads` is not
/// under `/api/upload`.
fn under(path: &str, root: &str) -> bool {
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Decide protection from method and path alone, before any token work.
pub fn classify(method: &Method, path: &str) -> Protection {
    if under(path, "/admin") {
        if under(path, LOGIN_PATH) {
            return Protection::Open;
        }
        return Protection::AdminPage;
    }

    if under(path, "/api/blog") {
        return if method == Method::GET {
            Protection::Open
        } else {
            Protection::Api
        };
    }

    if under(path, "/api/upload") {
        return Protection::Api;
    }

    Protection::Open
}

/// Tower layer that refuses gated requests lacking a valid session cookie.
///
/// Allowed requests reach the inner service unchanged.
#[derive(Clone)]
pub struct AuthGateLayer {
    tokens: Arc<SessionTokenService>,
    cookie_name: Arc<str>,
}

impl AuthGateLayer {
    pub fn new(tokens: Arc<SessionTokenService>, cookie_name: &str) -> Self {
        Self {
            tokens,
            cookie_name: Arc::from(cookie_name),
        }
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGateService {
            inner,
            tokens: self.tokens.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthGateService<S> {
    inner: S,
    tokens: Arc<SessionTokenService>,
    cookie_name: Arc<str>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for AuthGateService<S>
where
    S: Service<Request<ReqBody>, Response = Response<BoxBody<Bytes, Infallible>>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let protection = classify(req.method(), req.uri().path());

        if protection != Protection::Open {
            let token = get_cookie(req.headers(), &self.cookie_name).unwrap_or_default();

            if let Err(reason) = self.tokens.inspect(&token) {
                warn!(
                    "Gate refused {} {}: {}",
                    req.method(),
                    req.uri().path(),
                    reason
                );
                let denial = match protection {
                    Protection::AdminPage => redirect_to_login(req.uri().path()),
                    _ => unauthorized_json(),
                };
                return Box::pin(async move { Ok(denial) });
            }

            debug!("Gate passed {} {}", req.method(), req.uri().path());
        }

        // Take the instance that was polled ready, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

/// `/admin/login?redirect=<path>` with the original path form-encoded.
pub fn login_location(original_path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("redirect", original_path)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

fn redirect_to_login(original_path: &str) -> Response<BoxBody<Bytes, Infallible>> {
    let mut res = Response::new(empty());
    *res.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    if let Ok(location) = HeaderValue::from_str(&login_location(original_path)) {
        res.headers_mut().insert(header::LOCATION, location);
    } else {
        res.headers_mut()
            .insert(header::LOCATION, HeaderValue::from_static(LOGIN_PATH));
    }
    res
}

/// The single denial body for every gated API path.
pub fn unauthorized_json() -> Response<BoxBody<Bytes, Infallible>> {
    let body = serde_json::to_vec(&ErrorResponse::unauthorized()).unwrap_or_default();
    let mut res = Response::new(full(body));
    *res.status_mut() = StatusCode::UNAUTHORIZED;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    res
}
