//! Compiled template representation.
//!
//! # Responsibilities
//! - Classify raw file content as binary or text
//! - Compile `{{ name }}` placeholders into a reusable segment list
//! - Substitute named fields from a data mapping at render time
//!
//! # Design Decisions
//! - Placeholder names are plain field lookups only; nothing is evaluated,
//!   which removes the injection surface of generic code evaluation
//! - Binary content renders as the identity function (raw bytes back)
//! - Rendering is deterministic: same template and data, same bytes

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Errors raised while compiling a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An opening delimiter with no matching close.
    #[error("unclosed placeholder delimiter at byte {0}")]
    UnclosedDelimiter(usize),

    /// A placeholder with no field name inside.
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

/// Errors raised while rendering a compiled template.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A placeholder named a field absent from the data mapping.
    #[error("no value supplied for placeholder '{0}'")]
    MissingField(String),
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Field(String),
}

#[derive(Debug)]
enum Kind {
    /// Raw bytes, returned unchanged regardless of input data.
    Binary(Bytes),
    /// Literal runs interleaved with named placeholders.
    Text(Vec<Segment>),
}

/// A template compiled once and rendered many times.
#[derive(Debug)]
pub struct Template {
    kind: Kind,
}

impl Template {
    /// Compile raw file content.
    ///
    /// Content that is not valid UTF-8 is classified as binary and kept
    /// verbatim; text content is scanned for `{{ name }}` placeholders.
    pub fn compile(raw: Vec<u8>) -> Result<Self, TemplateError> {
        let text = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(err) => {
                return Ok(Self {
                    kind: Kind::Binary(Bytes::from(err.into_bytes())),
                })
            }
        };

        let mut segments = Vec::new();
        let mut rest = text.as_str();
        let mut offset = 0;
        while let Some(open) = rest.find(OPEN) {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + OPEN.len()..];
            let close = after_open
                .find(CLOSE)
                .ok_or(TemplateError::UnclosedDelimiter(offset + open))?;
            let name = after_open[..close].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder(offset + open));
            }
            segments.push(Segment::Field(name.to_string()));
            let consumed = open + OPEN.len() + close + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            kind: Kind::Text(segments),
        })
    }

    /// Whether this entry was classified as binary content.
    pub fn is_binary(&self) -> bool {
        matches!(self.kind, Kind::Binary(_))
    }

    /// Render with the given data mapping.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<Bytes, RenderError> {
        match &self.kind {
            Kind::Binary(raw) => Ok(raw.clone()),
            Kind::Text(segments) => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        Segment::Field(name) => {
                            let value = values
                                .get(name)
                                .ok_or_else(|| RenderError::MissingField(name.clone()))?;
                            out.push_str(value);
                        }
                    }
                }
                Ok(Bytes::from(out))
            }
        }
    }
}
