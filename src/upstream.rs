use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed upstream translation endpoint
pub const UPSTREAM_URL: &str = "https://api.openl.club/services/deepl/translate";

/// Default timeout for a single upstream call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body sent to the upstream provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamRequest {
    pub apikey: String,
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl UpstreamRequest {
    /// Build a request; language codes are always lower-cased
    pub fn new(apikey: &str, text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            apikey: apikey.to_string(),
            text: text.to_string(),
            source_lang: source_lang.to_lowercase(),
            target_lang: target_lang.to_lowercase(),
        }
    }
}

/// The parts of the upstream JSON document the relay looks at.
///
/// Everything else is ignored. `result` is kept as raw text so it can be
/// forwarded to the caller without reformatting.
#[derive(Debug, Default, Deserialize)]
pub struct UpstreamResponse {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub result: Option<Box<RawValue>>,
}

impl UpstreamResponse {
    /// Parse an upstream body leniently.
    ///
    /// A body that is not a JSON object becomes an empty response, so that
    /// classification can still fall back to the HTTP status.
    pub fn parse(body: &[u8]) -> Self {
        match serde_json::from_slice(body) {
            Ok(response) => response,
            Err(e) => {
                warn!("Upstream body is not a JSON object: {}", e);
                Self::default()
            }
        }
    }

    /// `error.code` in its textual form, if present
    pub fn error_code(&self) -> Option<String> {
        self.error
            .as_ref()
            .and_then(|error| error.get("code"))
            .map(value_to_text)
    }
}

/// Textual form of a JSON value: strings unquoted, null empty, the rest as JSON
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A completed upstream exchange
#[derive(Debug)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub body: UpstreamResponse,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err)
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// Client for the upstream translation provider.
///
/// Holds the process-wide credential and one reusable HTTP client.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl UpstreamClient {
    /// Create a client for the fixed upstream endpoint
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: UPSTREAM_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at another endpoint (used by tests with a mock server)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the upstream request for the given text and languages
    pub fn build_request(&self, text: &str, source_lang: &str, target_lang: &str) -> UpstreamRequest {
        UpstreamRequest::new(&self.api_key, text, source_lang, target_lang)
    }

    /// Perform a single upstream call. No retries.
    pub async fn translate(&self, request: &UpstreamRequest) -> Result<UpstreamReply, UpstreamError> {
        debug!(
            "Sending translation request upstream ({} -> {}, {} chars)",
            request.source_lang,
            request.target_lang,
            request.text.chars().count()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        debug!("Upstream responded with {} ({} bytes)", status, bytes.len());

        Ok(UpstreamReply {
            status,
            body: UpstreamResponse::parse(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_test_client(server: &MockServer) -> UpstreamClient {
        UpstreamClient::new("test-api-key", Duration::from_secs(5))
            .expect("Should build client")
            .with_endpoint(format!("{}/translate", server.uri()))
    }

    // ==================== UpstreamRequest Tests ====================

    #[test]
    fn test_request_lowercases_languages() {
        let request = UpstreamRequest::new("key", "Hallo", "DE", "EN");
        assert_eq!(request.source_lang, "de");
        assert_eq!(request.target_lang, "en");
        assert_eq!(request.text, "Hallo");
        assert_eq!(request.apikey, "key");
    }

    #[test]
    fn test_request_serialization_field_names() {
        let request = UpstreamRequest::new("key", "Hello", "EN", "DE");
        let json: Value = serde_json::to_value(&request).expect("Should serialize");

        assert_eq!(
            json,
            serde_json::json!({
                "apikey": "key",
                "text": "Hello",
                "source_lang": "en",
                "target_lang": "de"
            })
        );
    }

    #[test]
    fn test_request_keeps_empty_source() {
        let request = UpstreamRequest::new("key", "123", "", "EN");
        assert_eq!(request.source_lang, "");
    }

    proptest! {
        #[test]
        fn prop_language_codes_sent_lowercase(
            source in "[A-Za-z]{0,5}",
            target in "[A-Za-z]{0,5}",
        ) {
            let request = UpstreamRequest::new("key", "text", &source, &target);
            prop_assert_eq!(request.source_lang, source.to_lowercase());
            prop_assert_eq!(request.target_lang, target.to_lowercase());
        }
    }

    // ==================== UpstreamResponse Tests ====================

    #[test]
    fn test_parse_numeric_error_code() {
        let body = br#"{"error": {"code": -32600, "message": "Invalid targetLang"}}"#;
        let response = UpstreamResponse::parse(body);
        assert_eq!(response.error_code().as_deref(), Some("-32600"));
    }

    #[test]
    fn test_parse_string_error_code() {
        let body = br#"{"error": {"code": "-32503"}}"#;
        let response = UpstreamResponse::parse(body);
        assert_eq!(response.error_code().as_deref(), Some("-32503"));
    }

    #[test]
    fn test_parse_without_error() {
        let body = br#"{"result": {"texts": []}}"#;
        let response = UpstreamResponse::parse(body);
        assert!(response.error_code().is_none());
        assert!(response.result.is_some());
    }

    #[test]
    fn test_parse_error_without_code() {
        let body = br#"{"error": "something broke"}"#;
        let response = UpstreamResponse::parse(body);
        assert!(response.error_code().is_none());
    }

    #[test]
    fn test_parse_keeps_result_bytes() {
        let body = br#"{"result": {"b": 1,  "a": [1, 2]}}"#;
        let response = UpstreamResponse::parse(body);
        assert_eq!(response.result.unwrap().get(), r#"{"b": 1,  "a": [1, 2]}"#);
    }

    #[test]
    fn test_parse_null_result() {
        let response = UpstreamResponse::parse(br#"{"result": null}"#);
        assert!(response.result.is_none());
    }

    #[test]
    fn test_parse_non_json_body() {
        let response = UpstreamResponse::parse(b"<html>Too Many Requests</html>");
        assert!(response.error.is_none());
        assert!(response.result.is_none());
    }

    #[test]
    fn test_parse_empty_body() {
        let response = UpstreamResponse::parse(b"");
        assert!(response.result.is_none());
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&serde_json::json!("hi")), "hi");
        assert_eq!(value_to_text(&serde_json::json!(null)), "");
        assert_eq!(value_to_text(&serde_json::json!(42)), "42");
        assert_eq!(value_to_text(&serde_json::json!(true)), "true");
    }

    // ==================== UpstreamClient Tests ====================

    #[test]
    fn test_client_uses_fixed_endpoint_by_default() {
        let client = UpstreamClient::new("key", DEFAULT_TIMEOUT).expect("Should build client");
        assert_eq!(client.endpoint(), UPSTREAM_URL);
    }

    #[test]
    fn test_build_request_carries_api_key() {
        let client = UpstreamClient::new("secret", DEFAULT_TIMEOUT).expect("Should build client");
        let request = client.build_request("Hola", "ES", "EN");
        assert_eq!(request.apikey, "secret");
        assert_eq!(request.source_lang, "es");
    }

    #[tokio::test]
    async fn test_translate_posts_json_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({
                "apikey": "test-api-key",
                "text": "Hallo Welt",
                "source_lang": "de",
                "target_lang": "en"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"texts": [{"text": "Hello world", "alternatives": []}]}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let request = client.build_request("Hallo Welt", "DE", "EN");
        let reply = client.translate(&request).await.expect("Should succeed");

        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.body.result.is_some());
    }

    #[tokio::test]
    async fn test_translate_returns_rate_limit_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let request = client.build_request("Hello", "EN", "DE");
        let reply = client.translate(&request).await.expect("Should complete");

        assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);
        assert!(reply.body.result.is_none());
    }

    #[tokio::test]
    async fn test_translate_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new("key", Duration::from_millis(100))
            .expect("Should build client")
            .with_endpoint(format!("{}/translate", mock_server.uri()));
        let request = client.build_request("Hello", "EN", "DE");

        let err = client.translate(&request).await.expect_err("Should time out");
        assert!(matches!(err, UpstreamError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_translate_connection_refused() {
        // Bind then drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let client = UpstreamClient::new("key", Duration::from_secs(2))
            .expect("Should build client")
            .with_endpoint(format!("http://{}/translate", addr));
        let request = client.build_request("Hello", "EN", "DE");

        let err = client.translate(&request).await.expect_err("Should fail");
        assert!(matches!(err, UpstreamError::Transport(_)));
    }
}
