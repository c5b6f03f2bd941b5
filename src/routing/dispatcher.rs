//! Request dispatch with static fallback and 404 cascade.
//!
//! # Responsibilities
//! - Run the matched handler, or fall back to static rendering
//! - Normalize extension-less paths before the static attempt
//! - Walk the 404 cascade when nothing resolves
//!
//! # Design Decisions
//! - Handlers own their response; the dispatcher only supplies the cascade
//! - A handler error is caught here and answered with a logged 500, so a
//!   response is always written

use axum::http::StatusCode;

use crate::http::request::RequestContext;
use crate::http::response::{Reply, Responder};
use crate::routing::router::{Handler, RouteTable};

/// Resolve a request to a response.
///
/// Order: exact handler (or registered fallback) → static render of the
/// normalized path → 404 handler → static `404.html` → bare 404.
pub async fn dispatch(routes: &RouteTable, ctx: RequestContext, responder: Responder) -> Reply {
    let table = routes.table(ctx.method());

    if let Some(handler) = table.lookup(ctx.path()) {
        return run_handler(handler, ctx, responder).await;
    }

    let path = normalize(ctx.path());
    match responder.render_static(&path, StatusCode::OK).await {
        Ok(reply) => reply,
        Err(_) => {
            if let Some(handler) = table.not_found() {
                return run_handler(handler, ctx, responder).await;
            }
            match responder
                .render_static("404.html", StatusCode::NOT_FOUND)
                .await
            {
                Ok(reply) => reply,
                Err(_) => Reply::status(StatusCode::NOT_FOUND),
            }
        }
    }
}

/// Fallback-path normalization: the root becomes `/index.html`, and a path
/// without an extension gets `.html` appended.
fn normalize(path: &str) -> String {
    if path == "/" {
        return "/index.html".to_string();
    }
    if !path.contains('.') {
        return format!("{}.html", path);
    }
    path.to_string()
}

async fn run_handler(handler: &Handler, ctx: RequestContext, responder: Responder) -> Reply {
    let path = ctx.path().to_string();
    match handler(ctx, responder).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::error!(path = %path, error = %err, "Handler failed");
            Reply::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
