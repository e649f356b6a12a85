// Rust guideline compliant 2026-10-14

//! Shared domain types for the scoring API.
//!
//! Defines the [`Storage`] hexagonal port (the raw key-value connection
//! contract), [`StorageError`], the value codec shared by storage adapters,
//! and the [`Gender`] codes. All workspace crates depend on this crate; no
//! workspace crate is imported here.

use std::time::Duration;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Gender codes accepted by the scoring method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Code `0`.
    Unknown,
    /// Code `1`.
    Male,
    /// Code `2`.
    Female,
}

impl Gender {
    /// Map a wire code to a gender; `None` for anything outside `{0, 1, 2}`.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }

    /// Wire code of this gender.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    /// Lower-case display name (e.g. `"female"`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors a storage adapter or the store wrapper may return.
///
/// Transport timeouts are not represented: adapters log them and report
/// "no value" (reads) or a no-op (writes).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backing store could not be reached.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Human-readable description.
        reason: String,
    },
    /// Every retry attempt ended in a connection failure.
    #[error("connection failed after {attempts} attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },
    /// The backing store answered with something that could not be understood.
    #[error("protocol error: {reason}")]
    Protocol {
        /// Human-readable description.
        reason: String,
    },
}

impl StorageError {
    /// `true` for the variants that signal an unreachable store.
    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::RetriesExhausted { .. })
    }
}

// ---------------------------------------------------------------------------
// Storage port
// ---------------------------------------------------------------------------

/// Hexagonal port: raw connection to a key-value store with per-key expiry.
///
/// Implementations hold the connection handle (created by [`connect`](Self::connect),
/// never by the constructor). The store wrapper depends exclusively on this
/// trait -- never on a concrete adapter.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Storage {
    /// Open the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionFailed` when the store is unreachable.
    async fn connect(&self) -> Result<(), StorageError>;

    /// Read the value stored under `key`; `Ok(None)` when absent or timed out.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionFailed` when the store is unreachable,
    /// or `StorageError::Protocol` on a malformed reply.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store `value` under `key`, optionally expiring after `expires`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionFailed` when the store is unreachable,
    /// or `StorageError::Protocol` on a malformed reply.
    async fn set(&self, key: &str, value: &Value, expires: Option<Duration>)
    -> Result<(), StorageError>;

    /// Remove `key`; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionFailed` when the store is unreachable,
    /// or `StorageError::Protocol` on a malformed reply.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Drop the underlying connection. Idempotent.
    async fn close(&self);
}

// ---------------------------------------------------------------------------
// Value codec
// ---------------------------------------------------------------------------

/// Text written to the store for `value`.
///
/// Strings are written raw; every other value as its JSON text.
#[must_use]
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Value read back from stored `text`.
///
/// JSON-decodes when possible, otherwise returns the raw text as a string.
#[must_use]
pub fn decode_value(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[test]
    fn gender_codes_round_trip() {
        for code in 0..=2 {
            let gender = Gender::from_code(code).unwrap();
            assert_eq!(gender.code(), code);
        }
        assert_eq!(Gender::from_code(2).map(Gender::name), Some("female"));
        assert_eq!(Gender::from_code(3), None);
        assert_eq!(Gender::from_code(-1), None);
    }

    #[test]
    fn storage_error_messages() {
        let e1 = StorageError::ConnectionFailed { reason: "refused".to_owned() };
        let e2 = StorageError::RetriesExhausted { attempts: 5 };
        let e3 = StorageError::Protocol { reason: "bad reply".to_owned() };
        assert_eq!(e1.to_string(), "connection failed: refused");
        assert_eq!(e2.to_string(), "connection failed after 5 attempts");
        assert_eq!(e3.to_string(), "protocol error: bad reply");
        assert!(e1.is_connection_failure());
        assert!(e2.is_connection_failure());
        assert!(!e3.is_connection_failure());
    }

    #[test]
    fn strings_are_stored_raw() {
        assert_eq!(encode_value(&json!("world")), "world");
        assert_eq!(encode_value(&json!(3.5)), "3.5");
        assert_eq!(encode_value(&json!(["cars", "pets"])), r#"["cars","pets"]"#);
    }

    #[test]
    fn decode_falls_back_to_raw_text() {
        assert_eq!(decode_value("3.5".to_owned()), json!(3.5));
        assert_eq!(decode_value(r#"["a"]"#.to_owned()), json!(["a"]));
        assert_eq!(decode_value("world".to_owned()), json!("world"));
    }

    /// Verify that a minimal `Storage` implementation compiles and behaves.
    #[tokio::test]
    async fn storage_trait_minimal_impl() {
        struct MapStorage {
            inner: RefCell<HashMap<String, String>>,
        }

        impl Storage for MapStorage {
            async fn connect(&self) -> Result<(), StorageError> {
                Ok(())
            }

            async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
                Ok(self.inner.borrow().get(key).cloned().map(decode_value))
            }

            async fn set(
                &self,
                key: &str,
                value: &Value,
                _expires: Option<Duration>,
            ) -> Result<(), StorageError> {
                self.inner.borrow_mut().insert(key.to_owned(), encode_value(value));
                Ok(())
            }

            async fn delete(&self, key: &str) -> Result<(), StorageError> {
                self.inner.borrow_mut().remove(key);
                Ok(())
            }

            async fn close(&self) {}
        }

        let storage = MapStorage { inner: RefCell::new(HashMap::new()) };
        storage.connect().await.unwrap();
        storage.set("hello", &json!("world"), None).await.unwrap();
        assert_eq!(storage.get("hello").await.unwrap(), Some(json!("world")));
        storage.delete("hello").await.unwrap();
        assert_eq!(storage.get("hello").await.unwrap(), None);
        storage.close().await;
    }
}
