//! Request context: the queryable view of an incoming request.
//!
//! # Responsibilities
//! - Expose client address, path, raw query string and flattened parameters
//! - Parse the URL-encoded form body on demand (one-shot)
//! - Look up cookies by name from the Cookie header
//!
//! # Design Decisions
//! - Immutable after construction, except the one-shot body consumption
//! - Query parameters always flatten to the first scalar per key; form
//!   data flattening follows the `flatten_data` option

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, Method};
use thiserror::Error;
use url::form_urlencoded;

/// Cap on buffered form bodies.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Errors raised while reading the request body.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The body was already consumed by an earlier `post_data` call.
    #[error("request body already consumed")]
    BodyConsumed,

    /// The body could not be buffered (connection error or over the cap).
    #[error("failed to read request body: {0}")]
    Body(String),
}

/// Parsed URL-encoded form data.
///
/// Every value for a repeated key is retained unless flattening collapsed
/// them to the first scalar at parse time.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
}

impl FormData {
    /// First value for a key.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.first().map(String::as_str)
    }

    /// All values for a key.
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Per-request context handed to handlers and the dispatcher.
pub struct RequestContext {
    method: Method,
    client: SocketAddr,
    path: String,
    query: String,
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Option<Body>,
    flatten_data: bool,
}

impl RequestContext {
    pub(crate) fn new(
        parts: &Parts,
        client: SocketAddr,
        body: Body,
        flatten_data: bool,
    ) -> Self {
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().unwrap_or("").to_string();
        let mut params = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            // First scalar per key.
            params.entry(key.into_owned()).or_insert(value.into_owned());
        }
        Self {
            method: parts.method.clone(),
            client,
            path,
            query,
            params,
            headers: parts.headers.clone(),
            body: Some(body),
            flatten_data,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Client network address.
    pub fn client(&self) -> SocketAddr {
        self.client
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Flattened query parameters (first scalar per key).
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Buffer and parse the URL-encoded form body. One-shot: a second call
    /// returns `BodyConsumed`.
    pub async fn post_data(&mut self) -> Result<FormData, RequestError> {
        let body = self.body.take().ok_or(RequestError::BodyConsumed)?;
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| RequestError::Body(e.to_string()))?;

        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in form_urlencoded::parse(&bytes) {
            let values = fields.entry(key.into_owned()).or_default();
            if self.flatten_data && !values.is_empty() {
                continue;
            }
            values.push(value.into_owned());
        }
        Ok(FormData { fields })
    }

    /// Raw cookie value by name: everything after the first `=` of the
    /// matching pair, or `None` when absent or the header is missing.
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.headers.get(header::COOKIE)?.to_str().ok()?;
        header.split(';').find_map(|pair| {
            pair.trim()
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
    }
}
