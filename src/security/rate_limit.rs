//! Per-client sliding-window rate limiting middleware.
//!
//! # Responsibilities
//! - Track a one-second window of request timestamps per client address
//! - Ban a client for a cooldown period once the window overflows
//! - Answer denied requests with 429 and a Retry-After header
//!
//! # Design Decisions
//! - The window bounds burst rate; the ban is deliberately decoupled from
//!   window occupancy so a banned client serves out the full cooldown even
//!   after its window drains
//! - Client entries are never evicted; unbounded growth for clients that
//!   stop sending is an accepted tradeoff

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

const WINDOW: Duration = Duration::from_secs(1);

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

#[derive(Debug, Default)]
struct ClientWindow {
    /// Request timestamps, oldest first, non-decreasing.
    hits: VecDeque<Instant>,
    banned_until: Option<Instant>,
}

/// Sliding-window rate limiter keyed by client address.
pub struct RateLimiter {
    windows: DashMap<IpAddr, ClientWindow>,
    max_per_window: usize,
    ban: Duration,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, ban: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_per_window,
            ban,
        }
    }

    /// Record a request from `client` and decide admission.
    pub fn admit(&self, client: IpAddr) -> Admission {
        self.admit_at(client, Instant::now())
    }

    /// Admission check with an explicit clock, for deterministic tests.
    ///
    /// Holding the map entry serializes append, prune and ban-check for a
    /// single client; other clients are unaffected.
    pub fn admit_at(&self, client: IpAddr, now: Instant) -> Admission {
        let mut window = self.windows.entry(client).or_default();

        window.hits.push_back(now);
        // Timestamps arrive in order, so pruning is a prefix trim.
        while window
            .hits
            .front()
            .is_some_and(|&t| now.duration_since(t) > WINDOW)
        {
            window.hits.pop_front();
        }

        if window.hits.len() > self.max_per_window {
            window.banned_until = Some(now + self.ban);
        }

        match window.banned_until {
            Some(until) if until > now => Admission::Denied,
            _ => Admission::Allowed,
        }
    }

    /// Cooldown length, surfaced to clients via Retry-After.
    pub fn retry_after(&self) -> Duration {
        self.ban
    }
}

/// Middleware gating every request on the client's admission state.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.admit(addr.ip()) {
        Admission::Allowed => next.run(request).await,
        Admission::Denied => {
            tracing::warn!(client = %addr.ip(), "Access denied, client is serving a ban");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(limiter.retry_after().as_secs()),
            );
            response
        }
    }
}
