//! Template compilation and rendering subsystem.
//!
//! # Data Flow
//! ```text
//! render request (relative path, root kind, data)
//!     → cache.rs (resolve path within root, fetch or compile entry)
//!     → template.rs (placeholder substitution)
//!     → escape.rs (HTML-escape data values unless opted out)
//!     → rendered bytes, or a not-found outcome
//! ```
//!
//! # Design Decisions
//! - Compiled entries are immutable for the process lifetime (no reload)
//! - Placeholders are plain field lookups, never evaluated code
//! - Every failure inside this subsystem surfaces as not-found, never a panic

pub mod cache;
pub mod escape;
pub mod template;

pub use cache::{RenderData, RootKind, TemplateCache};
pub use template::{RenderError, Template, TemplateError};
