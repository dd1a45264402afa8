use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpListener;
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use crate::handlers::http::routes::{Router, build_site_router};
use crate::handlers::http::utils::internal_error;
use crate::tower_middle::{AuthGateLayer, AuthGateService};
use crate::{AppState, ReqBody};

/// The router as a tower service. Handler failures become a generic 500
/// here, so the service itself never fails.
#[derive(Clone)]
pub struct SiteService {
    router: Arc<Router>,
    state: AppState,
}

impl SiteService {
    pub fn new(router: Router, state: AppState) -> Self {
        Self {
            router: Arc::new(router),
            state,
        }
    }
}

impl Service<Request<ReqBody>> for SiteService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let router = self.router.clone();
        let state = self.state.clone();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            match router.route(req, state).await {
                Ok(response) => {
                    debug!("{} {} -> {}", method, path, response.status());
                    Ok(response)
                }
                Err(e) => {
                    error!("{} {} failed: {:#}", method, path, e);
                    Ok(internal_error())
                }
            }
        })
    }
}

/// Full request pipeline: session gate in front of the site router.
pub fn build_service(state: AppState) -> AuthGateService<SiteService> {
    let gate = AuthGateLayer::new(state.tokens.clone(), &state.session.cookie_name);
    gate.layer(SiteService::new(build_site_router(None), state))
}

/// Accept connections until `shutdown` resolves.
///
/// Every request body is wrapped in a size limit read from the live config
/// at accept time.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let service = build_service(state.clone());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let max_body = state.config.read().await.server.max_body_bytes;
                let max_body = usize::try_from(max_body).unwrap_or(usize::MAX);
                let svc = service.clone();
                let io = TokioIo::new(stream);

                tokio::task::spawn(async move {
                    // Gate and router are always ready.
                    let hyper_svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let mut svc = svc.clone();
                        let req: Request<ReqBody> =
                            req.map(|body| Limited::new(body, max_body).boxed());
                        svc.call(req)
                    });

                    if let Err(err) = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, hyper_svc)
                        .await
                    {
                        debug!("Error serving connection from {}: {:?}", peer, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    Ok(())
}
