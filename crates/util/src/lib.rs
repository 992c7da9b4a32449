pub mod async_runtime;
pub mod http;
pub mod logging;

pub use async_runtime::{RuntimeError, block_on_future};
pub use logging::init_tracing;

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)("(?:password|privateKey)"\s*:\s*")([^"]*)"#,
        r"(?i)(password=)([^\s&]+)",
        r"(?i)(privateKey=)([^\s&]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static redaction pattern"))
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Covers JSON members named `password` or `privateKey` (as they appear in
/// keystore and import-key RPC params) and `key=value` renderings of the same.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}<redacted>", prefix)
            })
            .to_string();
    }
    redacted
}
