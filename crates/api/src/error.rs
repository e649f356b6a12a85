// Rust guideline compliant 2026-10-17

//! Dispatch failures, their status codes and the response envelope.

use domain::StorageError;
use schema::FieldErrors;
use serde_json::{Value, json};

/// Success.
pub const OK: u16 = 200;
/// Malformed body at the HTTP boundary.
pub const BAD_REQUEST: u16 = 400;
/// Authentication failed.
pub const FORBIDDEN: u16 = 403;
/// Unknown method or path.
pub const NOT_FOUND: u16 = 404;
/// Field validation failed.
pub const INVALID_REQUEST: u16 = 422;
/// Unexpected failure.
pub const INTERNAL_ERROR: u16 = 500;

/// Generic message for an error `code`.
#[must_use]
pub fn generic_message(code: u16) -> &'static str {
    match code {
        BAD_REQUEST => "Bad Request",
        FORBIDDEN => "Forbidden",
        NOT_FOUND => "Not Found",
        INVALID_REQUEST => "Invalid Request",
        INTERNAL_ERROR => "Internal Server Error",
        _ => "Unknown Error",
    }
}

/// A terminal failure of one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The body could not be read as a JSON object.
    #[error("bad request: {reason}")]
    BadRequest {
        /// Parser diagnostic; logged, never sent to the caller.
        reason: String,
    },
    /// One or more fields failed validation.
    #[error("invalid request: {} field error(s)", .0.len())]
    InvalidRequest(FieldErrors),
    /// The token does not match the expected digest.
    #[error("Authentication failed for user {login}")]
    Forbidden {
        /// Login that failed to authenticate.
        login: String,
    },
    /// The method name is not in the method table.
    #[error("Method {method} not found")]
    NotFound {
        /// Requested method name.
        method: String,
    },
    /// The store failed in a way no fallback could absorb.
    #[error("internal error: {0}")]
    Internal(#[from] StorageError),
}

impl ApiError {
    /// Status code of this failure.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => BAD_REQUEST,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::Forbidden { .. } => FORBIDDEN,
            Self::NotFound { .. } => NOT_FOUND,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// Error payload sent to the caller: the field map for validation
    /// failures, a message otherwise.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::InvalidRequest(errors) => json!(errors),
            Self::Forbidden { .. } | Self::NotFound { .. } => Value::String(self.to_string()),
            Self::BadRequest { .. } | Self::Internal(_) => Value::String(generic_message(self.code()).to_owned()),
        }
    }
}

/// Wrap a dispatch outcome in the response envelope.
///
/// Success gives `{"response": result, "code": 200}`; failure gives
/// `{"error": payload, "code": code}`.
#[must_use]
pub fn envelope(outcome: &Result<Value, ApiError>) -> (u16, Value) {
    match outcome {
        Ok(result) => (OK, json!({"response": result, "code": OK})),
        Err(e) => {
            let code = e.code();
            (code, json!({"error": e.payload(), "code": code}))
        }
    }
}

/// Envelope for a bare status `code` with its generic message (e.g. an
/// unknown path).
#[must_use]
pub fn status_envelope(code: u16) -> Value {
    json!({"error": generic_message(code), "code": code})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
