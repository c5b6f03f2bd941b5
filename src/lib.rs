//! Plinth: a minimal template-serving HTTP layer.
//!
//! Requests are gated by a per-client sliding-window rate limiter, matched
//! against exact-path route tables, and otherwise answered by rendering
//! templated files from a content root with a defined 404 cascade.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod render;
pub mod routing;
pub mod security;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
