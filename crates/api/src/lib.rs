// Rust guideline compliant 2026-10-17

//! Scoring API core: request variants, auth check and the method dispatcher.
//!
//! Entry point: [`method_handler`]. It takes the parsed JSON body, a
//! [`RequestContext`] for diagnostics, the shared [`store::Store`] and the
//! [`AuthConfig`], and returns the method result or an [`ApiError`] whose
//! [`code`](ApiError::code) is the response status. [`envelope`] wraps either
//! outcome for the wire.

pub mod auth;
pub mod error;
pub mod handler;
pub mod requests;

pub use auth::{AuthConfig, AuthConfigBuilder, InvalidAuthConfig, check_auth, check_auth_at, sha512_hex};
pub use error::{ApiError, envelope, generic_message, status_envelope};
pub use handler::{ADMIN_SCORE, Method, RequestContext, method_handler, method_handler_at};
pub use requests::{ClientsInterestsRequest, MethodRequest, OnlineScoreRequest};
