//! # HTTP Utilities
//!
//! Strict JSON decoding for HTTP response bodies, with errors that carry the
//! status code and a preview of the offending body.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Decode `text` as `T`, failing loudly.
///
/// On failure the error names the HTTP status (when known) and keeps a
/// whitespace-collapsed preview of at most 200 characters of the body, which
/// is what a node returning HTML or a truncated envelope needs for diagnosis.
pub fn parse_response_json_strict<T: DeserializeOwned>(text: &str, status: Option<StatusCode>) -> Result<T, JsonParseError> {
    serde_json::from_str::<T>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        let preview = truncate_response_preview(text, 200);

        JsonParseError::new(status_note, error, preview)
    })
}

/// Collapse whitespace and cap `text` at roughly `limit` characters.
pub fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    /// Access the truncated response preview captured during parsing.
    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
