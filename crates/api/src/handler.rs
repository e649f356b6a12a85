// Rust guideline compliant 2026-10-17

//! Dispatcher: envelope validation, authentication, method lookup, payload
//! validation and result computation, in that order. The first failure ends
//! the request.

use chrono::{Local, NaiveDateTime};
use domain::Storage;
use schema::parse_at;
use scoring::{ScoreInput, get_interests, get_score};
use serde::Serialize;
use serde_json::{Map, Value, json};
use store::Store;

use crate::auth::{AuthConfig, check_auth_at};
use crate::error::ApiError;
use crate::requests::{ClientsInterestsRequest, MethodRequest, OnlineScoreRequest};

/// Score reported to the admin without touching the store.
pub const ADMIN_SCORE: i64 = 42;

// ---------------------------------------------------------------------------
// RequestContext
// ---------------------------------------------------------------------------

/// Per-request diagnostics. Filled in by the dispatcher, logged by the
/// boundary; never read by control flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Caller-supplied or generated request id.
    pub request_id: String,
    /// Non-empty scoring fields (`online_score` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<&'static str>>,
    /// Number of requested clients (`clients_interests` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nclients: Option<usize>,
}

impl RequestContext {
    /// Fresh context for `request_id`.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), ..Self::default() }
    }
}

// ---------------------------------------------------------------------------
// Method table
// ---------------------------------------------------------------------------

/// Methods the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `online_score`: score a person from identity fields.
    OnlineScore,
    /// `clients_interests`: interests of a list of clients.
    ClientsInterests,
}

impl Method {
    /// Every known method.
    pub const ALL: [Self; 2] = [Self::OnlineScore, Self::ClientsInterests];

    /// Wire name of the method.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::OnlineScore => "online_score",
            Self::ClientsInterests => "clients_interests",
        }
    }

    /// Resolve a wire name; `None` when unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Dispatch one method call at the local time.
///
/// # Errors
///
/// See [`method_handler_at`].
pub async fn method_handler<S: Storage>(
    body: Map<String, Value>,
    ctx: &mut RequestContext,
    store: &Store<S>,
    auth: &AuthConfig,
) -> Result<Value, ApiError> {
    method_handler_at(body, ctx, store, auth, Local::now().naive_local()).await
}

/// Dispatch one method call with an explicit "now" (admin token hour and
/// birthdate window).
///
/// # Errors
///
/// - [`ApiError::InvalidRequest`] when the envelope or the method payload
///   fails validation.
/// - [`ApiError::Forbidden`] when the token does not match.
/// - [`ApiError::NotFound`] when the method is unknown.
/// - [`ApiError::Internal`] when the store fails past its fallback.
pub async fn method_handler_at<S: Storage>(
    body: Map<String, Value>,
    ctx: &mut RequestContext,
    store: &Store<S>,
    auth: &AuthConfig,
    now: NaiveDateTime,
) -> Result<Value, ApiError> {
    let today = now.date();
    let request = parse_at::<MethodRequest>(body, today).map_err(ApiError::InvalidRequest)?;

    if !check_auth_at(&request, auth, now) {
        tracing::warn!(login = %request.login, "dispatch.auth.failed");
        return Err(ApiError::Forbidden { login: request.login });
    }

    let Some(method) = Method::from_name(&request.method) else {
        tracing::info!(method = %request.method, "dispatch.method.unknown");
        return Err(ApiError::NotFound { method: request.method });
    };

    let is_admin = request.is_admin(&auth.admin_login);
    tracing::debug!(method = method.name(), is_admin, "dispatch.method");
    match method {
        Method::OnlineScore => {
            let payload = parse_at::<OnlineScoreRequest>(request.arguments, today)
                .map_err(ApiError::InvalidRequest)?;
            Ok(online_score(&payload, is_admin, ctx, store).await)
        }
        Method::ClientsInterests => {
            let payload = parse_at::<ClientsInterestsRequest>(request.arguments, today)
                .map_err(ApiError::InvalidRequest)?;
            clients_interests(&payload, ctx, store).await
        }
    }
}

async fn online_score<S: Storage>(
    request: &OnlineScoreRequest,
    is_admin: bool,
    ctx: &mut RequestContext,
    store: &Store<S>,
) -> Value {
    ctx.has = Some(request.has.clone());
    if is_admin {
        return json!({"score": ADMIN_SCORE});
    }
    let input = ScoreInput {
        phone: request.phone.as_deref(),
        email: request.email.as_deref(),
        birthday: request.birthday,
        gender: request.gender,
        first_name: request.first_name.as_deref(),
        last_name: request.last_name.as_deref(),
    };
    json!({"score": get_score(store, &input).await})
}

async fn clients_interests<S: Storage>(
    request: &ClientsInterestsRequest,
    ctx: &mut RequestContext,
    store: &Store<S>,
) -> Result<Value, ApiError> {
    ctx.nclients = Some(request.client_ids.len());
    let mut result = Map::new();
    for &cid in &request.client_ids {
        let interests = get_interests(store, cid).await?;
        result.insert(format!("client_id{cid}"), json!(interests));
    }
    Ok(Value::Object(result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
