// Rust guideline compliant 2026-10-17

//! Auth check: SHA-512 credential digests.
//!
//! Regular callers present `sha512(account + login + salt)`. The admin
//! presents `sha512(YYYYMMDDHH + admin_salt)`, which rotates every hour.

use chrono::{Local, NaiveDateTime};
use sha2::{Digest, Sha512};

use crate::requests::MethodRequest;

/// Default shared secret.
pub const SALT: &str = "Otus";
/// Default admin login.
pub const ADMIN_LOGIN: &str = "admin";
/// Default admin secret.
pub const ADMIN_SALT: &str = "42";

/// The supplied auth configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid auth configuration: {reason}")]
pub struct InvalidAuthConfig {
    /// Human-readable description of the problem.
    pub reason: String,
}

/// Secrets used by [`check_auth`].
///
/// Construct via [`AuthConfig::builder`]; [`Default`] gives the built-in
/// secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Shared secret for regular callers.
    pub salt: String,
    /// Login that identifies the admin.
    pub admin_login: String,
    /// Admin-only secret.
    pub admin_salt: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: SALT.to_owned(),
            admin_login: ADMIN_LOGIN.to_owned(),
            admin_salt: ADMIN_SALT.to_owned(),
        }
    }
}

impl AuthConfig {
    /// Create a builder pre-filled with the built-in secrets.
    #[must_use]
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder { config: Self::default() }
    }
}

/// Builder for [`AuthConfig`].
///
/// Obtain via [`AuthConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Override the shared secret.
    #[must_use]
    pub fn salt(mut self, salt: impl Into<String>) -> Self {
        self.config.salt = salt.into();
        self
    }

    /// Override the admin login.
    #[must_use]
    pub fn admin_login(mut self, admin_login: impl Into<String>) -> Self {
        self.config.admin_login = admin_login.into();
        self
    }

    /// Override the admin secret.
    #[must_use]
    pub fn admin_salt(mut self, admin_salt: impl Into<String>) -> Self {
        self.config.admin_salt = admin_salt.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAuthConfig`] when the admin login is empty.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<AuthConfig, InvalidAuthConfig> {
        if self.config.admin_login.is_empty() {
            return Err(InvalidAuthConfig { reason: "admin_login must not be empty".to_owned() });
        }
        Ok(self.config)
    }
}

/// Lower-case hex SHA-512 of `input`.
#[must_use]
pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Token `request`'s caller must present at `now`.
#[must_use]
pub fn expected_token(request: &MethodRequest, auth: &AuthConfig, now: NaiveDateTime) -> String {
    if request.is_admin(&auth.admin_login) {
        sha512_hex(&format!("{}{}", now.format("%Y%m%d%H"), auth.admin_salt))
    } else {
        sha512_hex(&format!("{}{}{}", request.account, request.login, auth.salt))
    }
}

/// `true` when `request.token` matches the expected digest at the local time.
#[must_use]
pub fn check_auth(request: &MethodRequest, auth: &AuthConfig) -> bool {
    check_auth_at(request, auth, Local::now().naive_local())
}

/// `true` when `request.token` matches the expected digest at `now`.
#[must_use]
pub fn check_auth_at(request: &MethodRequest, auth: &AuthConfig, now: NaiveDateTime) -> bool {
    request.token == expected_token(request, auth, now)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::Map;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn request(account: &str, login: &str, token: &str) -> MethodRequest {
        MethodRequest {
            account: account.to_owned(),
            login: login.to_owned(),
            token: token.to_owned(),
            arguments: Map::new(),
            method: "online_score".to_owned(),
        }
    }

    #[test]
    fn sha512_hex_is_lowercase_128_chars() {
        let digest = sha512_hex("abc");
        assert_eq!(digest.len(), 128);
        assert!(digest.starts_with("ddaf35a193617aba"));
        assert_eq!(digest, digest.to_lowercase());
    }

    #[test]
    fn user_token_is_account_login_salt() {
        let auth = AuthConfig::default();
        let token = sha512_hex("horns&hoofsh&fOtus");
        assert!(check_auth_at(&request("horns&hoofs", "h&f", &token), &auth, at(10, 0)));
        assert!(!check_auth_at(&request("horns&hoofs", "h&f", "nope"), &auth, at(10, 0)));
        assert!(!check_auth_at(&request("", "h&f", &token), &auth, at(10, 0)));
        // Case-sensitive comparison.
        assert!(!check_auth_at(&request("horns&hoofs", "h&f", &token.to_uppercase()), &auth, at(10, 0)));
    }

    #[test]
    fn admin_token_rotates_hourly() {
        let auth = AuthConfig::default();
        let token = sha512_hex("202406011042");
        let admin = request("", "admin", &token);
        assert!(check_auth_at(&admin, &auth, at(10, 0)));
        assert!(check_auth_at(&admin, &auth, at(10, 59)));
        assert!(!check_auth_at(&admin, &auth, at(11, 0)));
    }

    #[test]
    fn builder_overrides_secrets() {
        let auth = AuthConfig::builder().salt("pepper").admin_login("root").admin_salt("7").build().unwrap();
        assert!(check_auth_at(&request("a", "b", &sha512_hex("abpepper")), &auth, at(0, 0)));
        assert!(check_auth_at(&request("", "root", &sha512_hex("20240601007")), &auth, at(0, 30)));
        // "admin" is a regular login now.
        assert!(check_auth_at(&request("", "admin", &sha512_hex("adminpepper")), &auth, at(0, 0)));
    }

    #[test]
    fn builder_rejects_empty_admin_login() {
        let result = AuthConfig::builder().admin_login("").build();
        assert!(matches!(result, Err(InvalidAuthConfig { .. })));
    }
}
