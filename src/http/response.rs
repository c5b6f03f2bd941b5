//! Response assembly: rendering, raw returns, redirects and cookies.
//!
//! # Responsibilities
//! - Delegate renders to the template cache and attach the resolved MIME type
//! - Build raw and redirect replies
//! - Assemble Set-Cookie headers from supplied attributes only
//!
//! # Design Decisions
//! - A reply is a single buffer plus headers; no streaming
//! - Rendered and raw text responses carry `; charset=utf-8`

use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use thiserror::Error;

use crate::http::mime;
use crate::render::{RenderData, RootKind, TemplateCache};

/// Errors a handler can surface. The dispatcher catches these and answers
/// with a 500, so a response is always written.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A requested render did not resolve to content.
    #[error("requested file not found: {0}")]
    NotFound(String),

    /// Anything else a handler wants to fail with.
    #[error("{0}")]
    Other(String),
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::Other(message.to_string())
    }
}

impl From<crate::http::request::RequestError> for HandlerError {
    fn from(err: crate::http::request::RequestError) -> Self {
        Self::Other(err.to_string())
    }
}

/// SameSite cookie attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A cookie to set on a reply. Only supplied attributes appear on the wire.
#[derive(Debug, Clone)]
pub struct Cookie {
    name: String,
    value: String,
    expires: Option<SystemTime>,
    max_age: Option<i64>,
    domain: Option<String>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    /// New cookie; HttpOnly by default, everything else unset.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: None,
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: true,
            same_site: None,
        }
    }

    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    /// Seconds until expiration; takes precedence over `expires` in clients.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Wire format of the Set-Cookie header value.
    pub fn encode(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(expires) = self.expires {
            out.push_str("; Expires=");
            out.push_str(&httpdate::fmt_http_date(expires));
        }
        if let Some(max_age) = self.max_age {
            out.push_str("; Max-Age=");
            out.push_str(&max_age.to_string());
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

/// An assembled response: status, headers and a single body buffer.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Reply {
    /// A bare status with an empty body.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn with_body(status: StatusCode, content_type: &str, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("text/plain")),
        );
        Self {
            status,
            headers,
            body,
        }
    }

    /// Append a Set-Cookie header.
    pub fn set_cookie(mut self, cookie: &Cookie) -> Self {
        if let Ok(value) = HeaderValue::from_str(&cookie.encode()) {
            self.headers.append(header::SET_COOKIE, value);
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Response-writing primitives handed to handlers alongside the request
/// context.
#[derive(Clone)]
pub struct Responder {
    templates: Arc<TemplateCache>,
}

impl Responder {
    pub(crate) fn new(templates: Arc<TemplateCache>) -> Self {
        Self { templates }
    }

    /// Render a file from the content root with the given data. The content
    /// type comes from the requested path's extension.
    pub async fn render(
        &self,
        path: &str,
        data: RenderData,
        status: StatusCode,
    ) -> Result<Reply, HandlerError> {
        self.render_from(path, RootKind::Public, &data, status).await
    }

    /// Render a file from the static-only subtree, with no data.
    pub async fn render_static(&self, path: &str, status: StatusCode) -> Result<Reply, HandlerError> {
        self.render_from(path, RootKind::Static, &RenderData::new(), status)
            .await
    }

    async fn render_from(
        &self,
        path: &str,
        kind: RootKind,
        data: &RenderData,
        status: StatusCode,
    ) -> Result<Reply, HandlerError> {
        match self.templates.render(path, kind, data).await {
            Some(bytes) => {
                let content_type = format!("{}; charset=utf-8", mime::resolve(path));
                Ok(Reply::with_body(status, &content_type, bytes))
            }
            None => Err(HandlerError::NotFound(path.to_string())),
        }
    }

    /// Raw body with an explicit content type.
    pub fn raw(&self, body: impl Into<Bytes>, content_type: &str, status: StatusCode) -> Reply {
        let content_type = format!("{}; charset=utf-8", content_type);
        Reply::with_body(status, &content_type, body.into())
    }

    /// 302 redirect to `location`.
    pub fn redirect(&self, location: &str) -> Reply {
        let mut reply = Reply::status(StatusCode::FOUND);
        if let Ok(value) = HeaderValue::from_str(location) {
            reply.headers.insert(header::LOCATION, value);
        }
        reply
    }
}
