//! Content-type resolution by file extension.
//!
//! Trivial extension lookup with a `text/plain` fallback for anything
//! unrecognized.

/// Resolve the content type for a path, e.g. `/index.html` → `text/html`.
pub fn resolve(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_text_plain()
        .essence_str()
        .to_string()
}
