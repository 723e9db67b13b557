use crate::handler::{self, ClientResponse, TranslationRequest, MSG_BODY_TOO_LARGE, MSG_INVALID_BODY};
use crate::session::SessionId;
use crate::upstream::UpstreamClient;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const BANNER: &str = "Translation relay is running. Go to /translate with POST.";

/// Shared state for all requests; read-only after startup
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub session_id: SessionId,
}

impl AppState {
    pub fn new(upstream: UpstreamClient, session_id: SessionId) -> Self {
        Self {
            upstream: Arc::new(upstream),
            session_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct BannerResponse {
    code: u16,
    message: &'static str,
}

/// Build the HTTP router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow any origin with the common methods and headers
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(12 * 60 * 60))
}

async fn index() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(BannerResponse {
            code: StatusCode::OK.as_u16(),
            message: BANNER,
        }),
    )
}

/// POST /translate
///
/// The body is read as JSON whatever the Content-Type says. Bodies over
/// axum's default limit (2 MB) are answered with a JSON 413.
async fn translate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ClientResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejecting translate body: {}", rejection.body_text());
            let status = rejection.status();
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                MSG_BODY_TOO_LARGE
            } else {
                MSG_INVALID_BODY
            };
            return ClientResponse::failure(status, message);
        }
    };

    let request: TranslationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed translate body: {}", e);
            return ClientResponse::failure(StatusCode::BAD_REQUEST, MSG_INVALID_BODY);
        }
    };

    handler::handle(&state.upstream, state.session_id, request).await
}
