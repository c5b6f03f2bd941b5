//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, address parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Bind address is not a parseable socket address.
    InvalidBindAddress(String),
    /// Content root path is empty.
    EmptyPublicDir,
    /// Rate limit threshold must admit at least one request.
    ZeroRateLimitThreshold,
    /// Ban duration must be at least one minute.
    ZeroBanMinutes,
    /// Request timeout must be non-zero.
    ZeroRequestTimeout,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid bind address: {}", addr)
            }
            ValidationError::EmptyPublicDir => write!(f, "site.public_dir must not be empty"),
            ValidationError::ZeroRateLimitThreshold => {
                write!(f, "rate_limit.max_requests_per_second must be at least 1")
            }
            ValidationError::ZeroBanMinutes => {
                write!(f, "rate_limit.ban_minutes must be at least 1")
            }
            ValidationError::ZeroRequestTimeout => {
                write!(f, "timeouts.request_secs must be at least 1")
            }
        }
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.site.public_dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyPublicDir);
    }
    if config.rate_limit.max_requests_per_second == 0 {
        errors.push(ValidationError::ZeroRateLimitThreshold);
    }
    if config.rate_limit.ban_minutes == 0 {
        errors.push(ValidationError::ZeroBanMinutes);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
