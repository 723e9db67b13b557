use crate::upstream::{value_to_text, UpstreamResponse};
use reqwest::StatusCode;
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::warn;

/// Upstream error codes meaning the target language was rejected
const INVALID_TARGET_LANG_CODES: [&str; 2] = ["-32600", "-32503"];

/// Verdict on a single upstream exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success {
        /// The raw `result` subtree, empty if upstream sent none
        data: String,
        alternatives: Vec<String>,
    },
    InvalidTargetLanguage,
    RateLimited,
    TransportError,
}

/// Classify an upstream response.
///
/// Checked in order: rejected target language, then rate limiting, then
/// success. Any other status is passed through as success.
pub fn interpret(response: &UpstreamResponse, status: StatusCode) -> Classification {
    if let Some(code) = response.error_code() {
        if INVALID_TARGET_LANG_CODES.contains(&code.as_str()) {
            if let Some(error) = &response.error {
                warn!("Upstream rejected the request: {}", error);
            }
            return Classification::InvalidTargetLanguage;
        }
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Classification::RateLimited;
    }

    if !status.is_success() {
        warn!("Upstream returned {}, passing payload through", status);
    }

    match response.result.as_deref() {
        Some(raw) => Classification::Success {
            data: raw_to_text(raw),
            alternatives: extract_alternatives(raw.get()),
        },
        None => Classification::Success {
            data: String::new(),
            alternatives: Vec::new(),
        },
    }
}

/// Raw JSON as forwarded text: strings lose their quotes, the rest is verbatim
fn raw_to_text(raw: &RawValue) -> String {
    let text = raw.get();
    if text.starts_with('"') {
        if let Ok(unquoted) = serde_json::from_str::<String>(text) {
            return unquoted;
        }
    }
    text.to_string()
}

/// Collect `texts[0].alternatives[*].alternative` from a raw `result` subtree
pub fn extract_alternatives(result: &str) -> Vec<String> {
    if result.is_empty() {
        return Vec::new();
    }

    let parsed: Value = match serde_json::from_str(result) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    parsed
        .pointer("/texts/0/alternatives")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| entry.get("alternative").map(value_to_text).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}
