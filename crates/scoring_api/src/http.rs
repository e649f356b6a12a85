// Rust guideline compliant 2026-10-18

//! HTTP boundary: `POST /method` in, `{"response"|"error", "code"}` out.
//!
//! Reads the raw body, turns it into a JSON object (400 otherwise), runs the
//! dispatcher inside a `request` span and logs the final context once.

use std::sync::Arc;

use api::{ApiError, AuthConfig, RequestContext, envelope, method_handler, status_envelope};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Map, Value};
use store::Store;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::adapters::Backend;

/// Header carrying a caller-chosen request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state: one store and one auth configuration for every request.
#[derive(Debug)]
pub struct AppState {
    /// Resilient store over the selected adapter.
    pub store: Store<Backend>,
    /// Credential secrets.
    pub auth: AuthConfig,
}

/// Build the router: `POST /method`, everything else 404.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/method", post(handle_method)).fallback(not_found).with_state(state)
}

/// Request id from `headers`, or a fresh UUID v4 in simple (hex) form.
#[must_use]
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().simple().to_string(), str::to_owned)
}

/// Parse `body` as a JSON object.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for invalid JSON or a non-object value.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::BadRequest { reason: format!("expected a JSON object, got {other}") }),
        Err(e) => Err(ApiError::BadRequest { reason: e.to_string() }),
    }
}

async fn handle_method(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let request_id = request_id(&headers);
    let span = tracing::info_span!("request", request_id = %request_id);
    dispatch(&state, request_id, &body).instrument(span).await
}

/// Run one call end to end and produce the status and envelope.
pub async fn dispatch(state: &AppState, request_id: String, body: &[u8]) -> (StatusCode, Json<Value>) {
    let mut ctx = RequestContext::new(request_id);
    let outcome = match parse_body(body) {
        Ok(map) => {
            tracing::debug!(bytes = body.len(), "http.method.body");
            method_handler(map, &mut ctx, &state.store, &state.auth).await
        }
        Err(e) => Err(e),
    };
    match &outcome {
        Err(e @ (ApiError::BadRequest { .. } | ApiError::Internal(_))) => {
            tracing::error!(error = %e, "http.method.failed");
        }
        Err(e) => tracing::info!(error = %e, "http.method.rejected"),
        Ok(_) => {}
    }
    let (code, body) = envelope(&outcome);
    let context = serde_json::to_string(&ctx).unwrap_or_default();
    tracing::info!(code, context = %context, "http.method.done");
    (status(code), Json(body))
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    tracing::info!(path = %uri.path(), "http.not_found");
    (StatusCode::NOT_FOUND, Json(status_envelope(StatusCode::NOT_FOUND.as_u16())))
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory_storage::InMemoryStorage;
    use api::sha512_hex;
    use axum::http::HeaderValue;
    use serde_json::json;
    use std::time::Duration;
    use store::StoreConfig;

    fn state() -> AppState {
        let config = StoreConfig::builder().delay(Duration::ZERO).build().unwrap();
        AppState {
            store: Store::new(Backend::Memory(InMemoryStorage::new()), config),
            auth: AuthConfig::default(),
        }
    }

    #[test]
    fn request_id_from_header_or_generated() {
        let mut headers = HeaderMap::new();
        let generated = request_id(&headers);
        assert_eq!(generated.len(), 32);
        assert!(generated.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(generated, request_id(&headers));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn body_must_be_a_json_object() {
        assert_eq!(parse_body(br#"{"login": "h&f"}"#).unwrap().len(), 1);
        for bad in [&b"{"[..], b"", b"[1, 2]", b"\"text\""] {
            let err = parse_body(bad).unwrap_err();
            assert_eq!(err.code(), 400);
        }
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_generic_message() {
        let (code, Json(body)) = dispatch(&state(), "t".to_owned(), b"{not json").await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Bad Request", "code": 400}));
    }

    #[tokio::test]
    async fn scoring_call_round_trip() {
        let state = state();
        let request = json!({
            "account": "horns&hoofs",
            "login": "h&f",
            "method": "online_score",
            "token": sha512_hex("horns&hoofsh&fOtus"),
            "arguments": {"phone": "79175002040", "email": "test@test.ru"},
        });
        let (code, Json(body)) = dispatch(&state, "t".to_owned(), request.to_string().as_bytes()).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, json!({"response": {"score": 3.0}, "code": 200}));
    }

    #[tokio::test]
    async fn validation_errors_are_422_with_field_map() {
        let (code, Json(body)) = dispatch(&state(), "t".to_owned(), b"{}").await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], 422);
        assert_eq!(body["error"]["login"], "CharField is required");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (code, Json(body)) = not_found(Uri::from_static("/nowhere")).await;
        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not Found", "code": 404}));
    }
}
