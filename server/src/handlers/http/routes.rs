use std::convert::Infallible;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use shared::types::session::TokenPayload;

use crate::handlers::http::utils::*;
use crate::handlers::http::{auth, blog, clients, site_content, upload};
use crate::tower_middle::tower_auth_gate::unauthorized_json;
use crate::{AppState, ReqBody};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two security tiers:
//
//   RouteHandler  : no auth.  Receives (req, state).
//                   Use for: public reads, login, logout, session status.
//
//   AdminHandler  : session token verified (signature, key id, expiry)
//                   before the handler runs.  Receives (req, state, payload).
//                   Use for: every mutation outside the gated paths, and
//                   the session info endpoints.

type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>;

type RouteHandler = Box<dyn Fn(Request<ReqBody>, AppState) -> HandlerFuture + Send + Sync>;

type AdminHandler =
    Box<dyn Fn(Request<ReqBody>, AppState, TokenPayload) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No authentication check.
    Open(RouteHandler),

    /// Valid session cookie required.
    /// Handler receives the verified `TokenPayload`.
    Admin(AdminHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
    web_dir: Option<String>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .field("web_dir", &self.web_dir)
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            web_dir: None,
        }
    }

    pub fn with_web_dir(mut self, web_dir: String) -> Self {
        self.web_dir = Some(web_dir);
        self
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn admin<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState, TokenPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Admin(Box::new(move |req, state, payload| {
                Box::pin(handler(req, state, payload))
            })),
        });
        self
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    /// GET with no authentication, for public reads.
    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    /// POST with no authentication at the router. Paths under the session
    /// gate are still checked there.
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    pub fn put<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.open(Method::PUT, path, handler)
    }

    pub fn delete<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.open(Method::DELETE, path, handler)
    }

    // ── Admin (valid session token) ──────────────────────────────────────────
    //
    // The router reads the session cookie and verifies the token before the
    // handler is called.  Handlers receive the verified payload and must NOT
    // verify again.

    pub fn get_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState, TokenPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.admin(Method::GET, path, handler)
    }

    pub fn post_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState, TokenPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.admin(Method::POST, path, handler)
    }

    pub fn put_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState, TokenPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.admin(Method::PUT, path, handler)
    }

    pub fn delete_admin<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<ReqBody>, AppState, TokenPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.admin(Method::DELETE, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<ReqBody>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Admin(h) => {
                    let token =
                        get_cookie(req.headers(), &state.session.cookie_name).unwrap_or_default();
                    match state.tokens.inspect(&token) {
                        Ok(payload) => h(req, state, payload).await,
                        Err(reason) => {
                            warn!("Admin route refused {} {}: {}", method, path, reason);
                            Ok(unauthorized_json())
                        }
                    }
                }
            };
        }

        // No registered route matched; try page and static file fallback.
        if method == Method::GET {
            if let Some(response) = self.try_serve_static(&path, &state).await? {
                return Ok(response);
            }
        }

        not_found("Endpoint not found").context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        // Exact match.
        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        // e.g.  "/api/blog/:id"  matches  "/api/blog/42"
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| (r.starts_with(':') && !p.is_empty()) || r == p)
    }

    // ── Page and static file fallback ─────────────────────────────────────────

    /// HTML file under `web_dir` that renders `path`, if it is a page route.
    pub fn page_file(path: &str) -> Option<&'static str> {
        match path {
            "/" | "/index.html" => Some("index.html"),
            "/blog" => Some("blog.html"),
            "/privacy-policy" => Some("privacy-policy.html"),
            "/admin" | "/admin/blog" => Some("admin/blog.html"),
            "/admin/login" => Some("admin/login.html"),
            p if Self::path_matches("/blog/:id", p) => Some("blog-post.html"),
            _ => None,
        }
    }

    async fn try_serve_static(
        &self,
        path: &str,
        state: &AppState,
    ) -> Result<Option<Response<BoxBody<Bytes, Infallible>>>> {
        let web_dir = match &self.web_dir {
            Some(dir) => dir.clone(),
            None => state.config.read().await.paths.web_dir.clone(),
        };
        let web_dir = web_dir.trim_end_matches('/');

        if let Some(file) = Self::page_file(path) {
            let file_path = format!("{}/{}", web_dir, file);
            debug!("Page {} -> {}", path, file_path);
            return deliver_html_page(&file_path)
                .await
                .context("Failed to deliver HTML page");
        }

        if let Some(rest) = path.strip_prefix("/static/") {
            if !is_safe_relative(rest) {
                warn!("Rejected static path: {}", path);
                return Ok(None);
            }
            let file_path = format!("{}{}", web_dir, path);
            return deliver_page_with_status(&file_path, StatusCode::OK, CacheStrategy::Yes)
                .await
                .context("Failed to deliver static file");
        }

        Ok(None)
    }
}

/// Relative path with no empty, `.` or `..` components.
fn is_safe_relative(rest: &str) -> bool {
    !rest.is_empty()
        && !rest.contains('\\')
        && Path::new(rest).components().all(|c| matches!(c, std::path::Component::Normal(_)))
        && !rest.split('/').any(|seg| seg.is_empty() || seg.starts_with('.'))
}

/// Numeric id in path segment `index` (`/api/blog/7` → segment 3).
pub fn path_id<B>(req: &Request<B>, index: usize) -> Option<i64> {
    req.uri()
        .path()
        .split('/')
        .nth(index)
        .and_then(|s| s.parse::<i64>().ok())
}

// ---------------------------------------------------------------------------
// Site router
//
// Auth tier is enforced here at the routing level. Handlers MUST NOT repeat
// the auth call.  The session gate in front of the router already covers the
// admin UI, blog writes and uploads; the admin tier covers the rest.
//
//   .get / .post / .put / .delete        → Open   : handler gets (req, state)
//   .get_admin / .post_admin / ...       → Admin  : handler gets (req, state, payload)
// ---------------------------------------------------------------------------

pub fn build_site_router(web_dir: Option<String>) -> Router {
    let mut router = Router::new();
    if let Some(dir) = web_dir {
        router = router.with_web_dir(dir);
    }

    router
        // ── Session ──────────────────────────────────────────────────────────
        .post("/api/auth", |req, state| async move {
            auth::handle_login(req, state).await.context("Login failed")
        })
        .get("/api/auth", |req, state| async move {
            auth::handle_status(req, state)
                .await
                .context("Session status failed")
        })
        .delete("/api/auth", |req, state| async move {
            auth::handle_logout(req, state).await.context("Logout failed")
        })
        .get_admin("/api/auth/sessions", |req, state, payload| async move {
            auth::handle_session_info(req, state, payload)
                .await
                .context("Session info failed")
        })
        .delete_admin("/api/auth/sessions", |req, state, _payload| async move {
            auth::handle_session_logout(req, state)
                .await
                .context("Logout failed")
        })
        // ── Blog: reads are public, writes sit behind the session gate ───────
        .get("/api/blog", |req, state| async move {
            blog::handle_list(req, state).await.context("Blog list failed")
        })
        .get("/api/blog/:id", |req, state| async move {
            blog::handle_get(req, state).await.context("Blog get failed")
        })
        .post("/api/blog", |req, state| async move {
            blog::handle_create(req, state)
                .await
                .context("Blog create failed")
        })
        .put("/api/blog/:id", |req, state| async move {
            blog::handle_update(req, state)
                .await
                .context("Blog update failed")
        })
        .delete("/api/blog/:id", |req, state| async move {
            blog::handle_delete(req, state)
                .await
                .context("Blog delete failed")
        })
        // ── Clients ───────────────────────────────────────────────────────────
        .get("/api/clients", |req, state| async move {
            clients::handle_list(req, state)
                .await
                .context("Client list failed")
        })
        .post_admin("/api/clients", |req, state, _payload| async move {
            clients::handle_create(req, state)
                .await
                .context("Client create failed")
        })
        .put_admin("/api/clients/:id", |req, state, _payload| async move {
            clients::handle_update(req, state)
                .await
                .context("Client update failed")
        })
        .delete_admin("/api/clients", |req, state, _payload| async move {
            clients::handle_delete(req, state)
                .await
                .context("Client delete failed")
        })
        .delete_admin("/api/clients/:id", |req, state, _payload| async move {
            clients::handle_delete(req, state)
                .await
                .context("Client delete failed")
        })
        // ── Uploads ──────────────────────────────────────────────────────────
        .post("/api/upload", |req, state| async move {
            upload::handle_upload(req, state)
                .await
                .context("Upload failed")
        })
        .get("/api/uploads/:filename", |req, state| async move {
            upload::handle_get_upload(req, state)
                .await
                .context("Upload fetch failed")
        })
        // ── Home page copy ───────────────────────────────────────────────────
        .get("/api/site-content/home", |req, state| async move {
            site_content::handle_get_home(req, state)
                .await
                .context("Site content get failed")
        })
        .put_admin("/api/site-content/home", |req, state, _payload| async move {
            site_content::handle_put_home(req, state)
                .await
                .context("Site content update failed")
        })
        .get("/health", |_req, _state| async move {
            deliver_serialized_json(&serde_json::json!({"status": "ok"}), StatusCode::OK)
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
