//! Route tables and handler registration.
//!
//! # Responsibilities
//! - Store one exact-path handler table per method (GET, POST)
//! - Hold the reserved fallback (default) and not-found handlers per table
//! - Look up the handler for a request, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - At most one handler per (method, path); last registration wins

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::Method;

use crate::http::request::RequestContext;
use crate::http::response::{HandlerError, Reply, Responder};

/// Boxed future returned by a handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, HandlerError>> + Send>>;

/// A registered request handler.
pub type Handler = Arc<dyn Fn(RequestContext, Responder) -> HandlerFuture + Send + Sync>;

/// Handlers for a single method: exact paths plus the reserved slots.
#[derive(Clone, Default)]
pub struct MethodRoutes {
    handlers: HashMap<String, Handler>,
    /// Runs for any path with no exact match, before the static fallback.
    fallback: Option<Handler>,
    /// Runs when the static fallback also fails to resolve.
    not_found: Option<Handler>,
}

impl MethodRoutes {
    /// Exact handler for `path`, or the fallback handler if registered.
    pub fn lookup(&self, path: &str) -> Option<&Handler> {
        self.handlers.get(path).or(self.fallback.as_ref())
    }

    pub fn not_found(&self) -> Option<&Handler> {
        self.not_found.as_ref()
    }
}

/// The two independent route tables, populated once at startup.
#[derive(Clone, Default)]
pub struct RouteTable {
    get: MethodRoutes,
    post: MethodRoutes,
}

fn wrap<H, Fut>(handler: H) -> Handler
where
    H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
{
    Arc::new(move |ctx, responder| Box::pin(handler(ctx, responder)))
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a GET handler for an exact path.
    pub fn on_get<H, Fut>(&mut self, path: impl Into<String>, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.get.handlers.insert(path.into(), wrap(handler));
    }

    /// Register a POST handler for an exact path.
    pub fn on_post<H, Fut>(&mut self, path: impl Into<String>, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.post.handlers.insert(path.into(), wrap(handler));
    }

    /// Register the GET fallback handler, consulted for any unmatched path.
    pub fn get_fallback<H, Fut>(&mut self, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.get.fallback = Some(wrap(handler));
    }

    /// Register the POST fallback handler.
    pub fn post_fallback<H, Fut>(&mut self, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.post.fallback = Some(wrap(handler));
    }

    /// Register the GET 404 handler.
    pub fn get_not_found<H, Fut>(&mut self, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.get.not_found = Some(wrap(handler));
    }

    /// Register the POST 404 handler.
    pub fn post_not_found<H, Fut>(&mut self, handler: H)
    where
        H: Fn(RequestContext, Responder) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        self.post.not_found = Some(wrap(handler));
    }

    /// Table for a request method. Anything other than POST goes through
    /// the GET table; that fallback is documented behavior, not an error.
    pub fn table(&self, method: &Method) -> &MethodRoutes {
        if *method == Method::POST {
            &self.post
        } else {
            &self.get
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn exact_paths_are_independent_per_method() {
        let mut routes = RouteTable::new();
        routes.on_get("/a", |_ctx, _r| async { Ok(Reply::status(StatusCode::OK)) });
        assert!(routes.table(&Method::GET).lookup("/a").is_some());
        assert!(routes.table(&Method::POST).lookup("/a").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut routes = RouteTable::new();
        routes.on_get("/a", |_ctx, _r| async { Ok(Reply::status(StatusCode::OK)) });
        routes.on_get("/a", |_ctx, _r| async {
            Ok(Reply::status(StatusCode::IM_A_TEAPOT))
        });
        // One entry remains for the path.
        assert!(routes.table(&Method::GET).lookup("/a").is_some());
        assert_eq!(routes.get.handlers.len(), 1);
    }

    #[test]
    fn fallback_handler_catches_unmatched_paths() {
        let mut routes = RouteTable::new();
        assert!(routes.table(&Method::GET).lookup("/missing").is_none());
        routes.get_fallback(|_ctx, _r| async { Ok(Reply::status(StatusCode::OK)) });
        assert!(routes.table(&Method::GET).lookup("/missing").is_some());
    }

    #[test]
    fn unknown_methods_use_the_get_table() {
        let mut routes = RouteTable::new();
        routes.on_get("/a", |_ctx, _r| async { Ok(Reply::status(StatusCode::OK)) });
        assert!(routes.table(&Method::PUT).lookup("/a").is_some());
        assert!(routes.table(&Method::DELETE).lookup("/a").is_some());
    }
}
