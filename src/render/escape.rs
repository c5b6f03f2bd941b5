//! HTML escaping for template data.
//!
//! # Design Decisions
//! - Every character outside `[0-9A-Za-z ]` is replaced with its decimal
//!   numeric character reference (`&#<code>;`). This escapes punctuation
//!   too, which is deliberately more aggressive than a conventional HTML
//!   escaper. The behavior is observable and preserved exactly.

use std::collections::HashMap;

/// Escape a single string value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == ' ' {
            out.push(c);
        } else {
            out.push_str("&#");
            out.push_str(&(c as u32).to_string());
            out.push(';');
        }
    }
    out
}

/// Escape every value of a data mapping, keys untouched.
pub fn escape_values(values: &HashMap<String, String>) -> HashMap<String, String> {
    values
        .iter()
        .map(|(k, v)| (k.clone(), escape_html(v)))
        .collect()
}
