//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all serve handler
//! - Wire up middleware (rate limit gate, timeout, request ID, tracing)
//! - Prepare the template cache (eager preload in whitelist mode)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::RequestContext;
use crate::http::response::Responder;
use crate::render::TemplateCache;
use crate::routing::{dispatch, RouteTable};
use crate::security::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub templates: Arc<TemplateCache>,
    pub limiter: Arc<RateLimiter>,
    pub flatten_data: bool,
}

/// HTTP server owning the wired router.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Build the server: prepare the template cache (walking the content
    /// root when whitelist mode is on) and wire the router.
    pub async fn build(config: ServerConfig, routes: RouteTable) -> std::io::Result<Self> {
        let mut templates =
            TemplateCache::new(&config.site.public_dir, config.site.escape_render);
        if config.site.whitelist_paths {
            let compiled = templates.preload().await?;
            tracing::info!(
                templates = compiled,
                root = %config.site.public_dir.display(),
                "Content root preloaded, cache locked"
            );
        }

        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests_per_second,
            Duration::from_secs(config.rate_limit.ban_minutes * 60),
        ));

        let state = AppState {
            routes: Arc::new(routes),
            templates: Arc::new(templates),
            limiter,
            flatten_data: config.site.flatten_data,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(serve_handler))
            .route("/", any(serve_handler))
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(
                state.limiter,
                rate_limit_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Catch-all handler: build the request context and hand off to the
/// dispatcher.
async fn serve_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();
    let ctx = RequestContext::new(&parts, addr, body, state.flatten_data);
    let responder = Responder::new(state.templates.clone());

    tracing::debug!(
        client = %addr,
        method = %ctx.method(),
        path = %ctx.path(),
        "Dispatching request"
    );

    dispatch(&state.routes, ctx, responder).await.into_response()
}
