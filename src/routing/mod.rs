//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (exact lookup in the per-method table)
//!     → found: handler runs and owns the response
//!     → not found: dispatcher.rs fallback
//!         path normalization → static render → 404 cascade
//! ```
//!
//! # Design Decisions
//! - Route tables populated before serving, immutable afterwards
//! - Exact path matching only; last registration wins
//! - Methods other than GET/POST dispatch through the GET table
//! - Explicit 404 cascade rather than silent defaults

pub mod dispatcher;
pub mod router;

pub use dispatcher::dispatch;
pub use router::{Handler, RouteTable};
