use crate::detector;
use crate::interpreter::{interpret, Classification};
use crate::session::SessionId;
use crate::upstream::UpstreamClient;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{error, info};

/// Target language used when the caller sends none
pub const DEFAULT_TARGET_LANG: &str = "EN";

pub const MSG_NO_TEXT: &str = "No Translate Text Found";
pub const MSG_INVALID_TARGET_LANG: &str = "Invalid targetLang";
pub const MSG_TOO_MANY_REQUESTS: &str = "Too Many Requests";
pub const MSG_UPSTREAM_FAILED: &str = "Upstream Request Failed";
pub const MSG_INVALID_BODY: &str = "Invalid Request Body";
pub const MSG_BODY_TOO_LARGE: &str = "Request Body Too Large";

/// Inbound translation request. Missing and null fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranslationRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_lang: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_lang: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response sent back to the caller. The HTTP status mirrors `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientResponse {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClientResponse {
    pub fn success(id: SessionId, data: String, alternatives: Vec<String>) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            id: Some(id),
            data: Some(data),
            alternatives: Some(alternatives),
            message: None,
        }
    }

    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self {
            code: status.as_u16(),
            id: None,
            data: None,
            alternatives: None,
            message: Some(message.to_string()),
        }
    }

    /// Map an interpreter verdict to the client contract
    pub fn from_classification(classification: Classification, id: SessionId) -> Self {
        match classification {
            Classification::Success { data, alternatives } => Self::success(id, data, alternatives),
            Classification::InvalidTargetLanguage => {
                Self::failure(StatusCode::NOT_ACCEPTABLE, MSG_INVALID_TARGET_LANG)
            }
            Classification::RateLimited => {
                Self::failure(StatusCode::TOO_MANY_REQUESTS, MSG_TOO_MANY_REQUESTS)
            }
            Classification::TransportError => {
                Self::failure(StatusCode::BAD_GATEWAY, MSG_UPSTREAM_FAILED)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ClientResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Handle one translation request end to end.
///
/// Fills in defaults, rejects empty text without calling upstream, makes a
/// single upstream call and maps the outcome to a client response. Never
/// fails: every error becomes a client-visible status and message.
pub async fn handle(
    upstream: &UpstreamClient,
    session_id: SessionId,
    request: TranslationRequest,
) -> ClientResponse {
    let TranslationRequest {
        text,
        mut source_lang,
        mut target_lang,
    } = request;

    if source_lang.is_empty() {
        source_lang = detector::detect(&text);
    }
    if target_lang.is_empty() {
        target_lang = DEFAULT_TARGET_LANG.to_string();
    }

    if text.is_empty() {
        return ClientResponse::failure(StatusCode::NOT_FOUND, MSG_NO_TEXT);
    }

    let upstream_request = upstream.build_request(&text, &source_lang, &target_lang);

    let classification = match upstream.translate(&upstream_request).await {
        Ok(reply) => interpret(&reply.body, reply.status),
        Err(e) => {
            error!("Upstream call failed: {}", e);
            Classification::TransportError
        }
    };

    if let Classification::Success { alternatives, .. } = &classification {
        info!(
            "Translated {} -> {} ({} alternatives)",
            upstream_request.source_lang,
            upstream_request.target_lang,
            alternatives.len()
        );
    }

    ClientResponse::from_classification(classification, session_id)
}
