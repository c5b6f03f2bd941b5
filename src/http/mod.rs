//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, rate limit gate, middleware layers)
//!     → request.rs (context: path, params, cookies, body)
//!     → [routing layer resolves handler or static fallback]
//!     → response.rs (reply assembly, cookies, redirects)
//!     → Send to client
//! ```

pub mod mime;
pub mod request;
pub mod response;
pub mod server;

pub use request::{FormData, RequestContext};
pub use response::{Cookie, HandlerError, Reply, Responder, SameSite};
pub use server::HttpServer;
