//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (client address)
//!     → rate_limit.rs middleware (admission check)
//!     → Allowed: request continues to the dispatcher
//!     → Denied: 429 with Retry-After, request never reaches the dispatcher
//! ```
//!
//! # Design Decisions
//! - The rate limit gate is the only middleware that can refuse a request
//! - Per-client state is independent; no cross-client locking

pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, Admission, RateLimiter};
