// Rust guideline compliant 2026-10-16

//! Store component -- retry and cache-fallback orchestration around a
//! `Storage` hexagonal port.
//!
//! Entry points: [`Store::get`], [`Store::set`], [`Store::delete`] (retried),
//! and [`Store::cache_get`], [`Store::cache_set`] (single best-effort call).
//! Configuration via [`StoreConfig::builder`].
//!
//! The store holds no connection state of its own: every call is forwarded
//! to the injected adapter, whose lifecycle is driven through
//! [`Store::connect`] and [`Store::close`].

use std::time::Duration;

use domain::{Storage, StorageError};
use serde_json::Value;

/// Default number of attempts for retried operations.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default fixed delay between two attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// StoreConfig + builder
// ---------------------------------------------------------------------------

/// The supplied store configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid store configuration: {reason}")]
pub struct InvalidConfig {
    /// Human-readable description of the problem.
    pub reason: String,
}

/// Retry policy for a [`Store`].
///
/// Construct via [`StoreConfig::builder`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Attempts per retried operation (range: `[1, u32::MAX]`).
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

/// Builder for [`StoreConfig`].
///
/// Obtain via [`StoreConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct StoreConfigBuilder {
    attempts: u32,
    delay: Duration,
}

impl StoreConfig {
    /// Create a builder.
    ///
    /// Default values: `attempts = 5`, `delay = 500 ms`.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder { attempts: DEFAULT_ATTEMPTS, delay: DEFAULT_DELAY }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { attempts: DEFAULT_ATTEMPTS, delay: DEFAULT_DELAY }
    }
}

impl StoreConfigBuilder {
    /// Override the number of attempts.
    #[must_use]
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Override the delay between attempts. `Duration::ZERO` is useful in tests.
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`] when `attempts` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<StoreConfig, InvalidConfig> {
        if self.attempts == 0 {
            return Err(InvalidConfig { reason: "attempts must be >= 1".to_owned() });
        }
        Ok(StoreConfig { attempts: self.attempts, delay: self.delay })
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Whether a durable read may fall back to the cache path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheFallback {
    /// After retries are exhausted, answer from [`Store::cache_get`].
    #[default]
    Enabled,
    /// Propagate the connection failure.
    Disabled,
}

/// Resilience wrapper around a [`Storage`] adapter.
///
/// Generic over `S: Storage` for zero-cost static dispatch. One instance is
/// created at startup and shared by every request.
#[derive(Debug)]
pub struct Store<S> {
    storage: S,
    config: StoreConfig,
}

impl<S: Storage> Store<S> {
    /// Wrap `storage` with the retry policy in `config`.
    #[must_use]
    pub fn new(storage: S, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// The wrapped adapter.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The retry policy.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the adapter's connection.
    ///
    /// # Errors
    ///
    /// Propagates the adapter's `StorageError`.
    pub async fn connect(&self) -> Result<(), StorageError> {
        self.storage.connect().await
    }

    /// Drop the adapter's connection.
    pub async fn close(&self) {
        self.storage.close().await;
    }

    /// Durable read with cache fallback enabled.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Protocol` on a malformed reply; connection
    /// failures are absorbed by the fallback.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.get_with(key, CacheFallback::Enabled).await
    }

    /// Durable read, retried; on exhaustion either falls back to
    /// [`cache_get`](Self::cache_get) or propagates, per `fallback`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RetriesExhausted` when every attempt failed and
    /// `fallback` is `Disabled`, or `StorageError::Protocol` on a malformed reply.
    pub async fn get_with(
        &self,
        key: &str,
        fallback: CacheFallback,
    ) -> Result<Option<Value>, StorageError> {
        match self.with_retry("get", key, || self.storage.get(key)).await {
            Err(e) if e.is_connection_failure() && fallback == CacheFallback::Enabled => {
                tracing::warn!(key, error = %e, "store.get.fallback");
                Ok(self.cache_get(key).await)
            }
            other => other,
        }
    }

    /// Durable write without expiry, retried.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RetriesExhausted` when every attempt failed, or
    /// `StorageError::Protocol` on a malformed reply.
    pub async fn set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        self.with_retry("set", key, || self.storage.set(key, value, None)).await
    }

    /// Durable delete, retried.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::RetriesExhausted` when every attempt failed, or
    /// `StorageError::Protocol` on a malformed reply.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with_retry("delete", key, || self.storage.delete(key)).await
    }

    /// Best-effort cache read: one attempt, failures logged and read as "no value".
    pub async fn cache_get(&self, key: &str) -> Option<Value> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "store.cache_get.failed");
                None
            }
        }
    }

    /// Best-effort cache write: one attempt, failures logged and dropped.
    pub async fn cache_set(&self, key: &str, value: &Value, expires: Option<Duration>) {
        if let Err(e) = self.storage.set(key, value, expires).await {
            tracing::warn!(key, error = %e, "store.cache_set.failed");
        }
    }

    /// Run `call` up to `config.attempts` times while it reports a connection
    /// failure, sleeping `config.delay` between attempts.
    async fn with_retry<T, F, Fut>(&self, op: &str, key: &str, mut call: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let attempts = self.config.attempts;
        for attempt in 1..=attempts {
            match call().await {
                Err(e) if e.is_connection_failure() => {
                    tracing::info!(op, key, attempt, error = %e, "store.retry");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.delay).await;
                    }
                }
                other => return other,
            }
        }
        tracing::error!(op, key, attempts, "store.retry.exhausted");
        Err(StorageError::RetriesExhausted { attempts })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{CacheFallback, InvalidConfig, Store, StoreConfig};
    use domain::{Storage, StorageError, decode_value, encode_value};
    use serde_json::{Value, json};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::time::Duration;

    // ------------------------------------------------------------------
    // Test helpers
    // ------------------------------------------------------------------

    /// Storage that fails the first `fail_first` calls, then behaves like a map.
    struct FlakyStorage {
        fail_first: u32,
        failure: StorageError,
        calls: Cell<u32>,
        data: RefCell<HashMap<String, String>>,
        last_expiry: Cell<Option<Duration>>,
    }

    impl FlakyStorage {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                failure: StorageError::ConnectionFailed { reason: "refused".to_owned() },
                calls: Cell::new(0),
                data: RefCell::new(HashMap::new()),
                last_expiry: Cell::new(None),
            }
        }

        fn broken(failure: StorageError) -> Self {
            Self { failure, ..Self::new(u32::MAX) }
        }

        fn seeded(fail_first: u32, key: &str, value: &str) -> Self {
            let storage = Self::new(fail_first);
            storage.data.borrow_mut().insert(key.to_owned(), value.to_owned());
            storage
        }

        fn tick(&self) -> Result<(), StorageError> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            if n <= self.fail_first { Err(self.failure.clone()) } else { Ok(()) }
        }
    }

    impl Storage for FlakyStorage {
        async fn connect(&self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.tick()?;
            Ok(self.data.borrow().get(key).cloned().map(decode_value))
        }

        async fn set(
            &self,
            key: &str,
            value: &Value,
            expires: Option<Duration>,
        ) -> Result<(), StorageError> {
            self.tick()?;
            self.last_expiry.set(expires);
            self.data.borrow_mut().insert(key.to_owned(), encode_value(value));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.tick()?;
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        async fn close(&self) {}
    }

    fn store(storage: FlakyStorage) -> Store<FlakyStorage> {
        let config = StoreConfig::builder().delay(Duration::ZERO).build().unwrap();
        Store::new(storage, config)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    #[test]
    fn config_defaults() {
        let config = StoreConfig::builder().build().unwrap();
        assert_eq!(config.attempts, 5);
        assert_eq!(config.delay, Duration::from_millis(500));
    }

    #[test]
    fn config_rejects_zero_attempts() {
        let result = StoreConfig::builder().attempts(0).build();
        assert!(matches!(result, Err(InvalidConfig { .. })));
    }

    // ------------------------------------------------------------------
    // Retry policy
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn succeeds_on_fifth_attempt() {
        let store = store(FlakyStorage::seeded(4, "hello", "world"));
        let value = store.get_with("hello", CacheFallback::Disabled).await.unwrap();
        assert_eq!(value, Some(json!("world")));
        assert_eq!(store.storage().calls.get(), 5);
    }

    #[tokio::test]
    async fn gives_up_after_exactly_five_attempts() {
        let store = store(FlakyStorage::new(5));
        let result = store.set("foo", &json!("bar")).await;
        assert_eq!(result, Err(StorageError::RetriesExhausted { attempts: 5 }));
        assert_eq!(store.storage().calls.get(), 5);
    }

    #[tokio::test]
    async fn get_without_fallback_propagates_exhaustion() {
        let store = store(FlakyStorage::new(u32::MAX));
        let result = store.get_with("hello", CacheFallback::Disabled).await;
        assert_eq!(result, Err(StorageError::RetriesExhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn protocol_errors_are_not_retried() {
        let store = store(FlakyStorage::broken(StorageError::Protocol { reason: "junk".to_owned() }));
        let result = store.delete("hello").await;
        assert!(matches!(result, Err(StorageError::Protocol { .. })), "{result:?}");
        assert_eq!(store.storage().calls.get(), 1);
    }

    #[tokio::test]
    async fn custom_attempt_count_is_honored() {
        let config = StoreConfig::builder().attempts(2).delay(Duration::ZERO).build().unwrap();
        let store = Store::new(FlakyStorage::new(u32::MAX), config);
        let result = store.delete("k").await;
        assert_eq!(result, Err(StorageError::RetriesExhausted { attempts: 2 }));
        assert_eq!(store.storage().calls.get(), 2);
    }

    // ------------------------------------------------------------------
    // Cache fallback
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn get_falls_back_to_cache_after_exhaustion() {
        // Five durable attempts fail; the sixth call is the cache read.
        let store = store(FlakyStorage::seeded(5, "spam", "eggs"));
        let value = store.get("spam").await.unwrap();
        assert_eq!(value, Some(json!("eggs")));
        assert_eq!(store.storage().calls.get(), 6);
    }

    #[tokio::test]
    async fn fallback_never_raises_when_cache_is_down_too() {
        let store = store(FlakyStorage::new(u32::MAX));
        assert_eq!(store.get("spam").await, Ok(None));
    }

    #[tokio::test]
    async fn cache_path_is_single_best_effort_call() {
        let store = store(FlakyStorage::new(u32::MAX));
        store.cache_set("k", &json!(1.5), Some(Duration::from_secs(3600))).await;
        assert_eq!(store.cache_get("k").await, None);
        assert_eq!(store.storage().calls.get(), 2);
    }

    // ------------------------------------------------------------------
    // Happy path
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn set_get_delete_round() {
        let store = store(FlakyStorage::new(0));
        store.connect().await.unwrap();
        store.set("hello", &json!("world")).await.unwrap();
        store.set("spam", &json!("eggs")).await.unwrap();
        assert_eq!(store.get("hello").await.unwrap(), Some(json!("world")));
        assert_eq!(store.get("scramble").await.unwrap(), None);

        store.cache_set("spam", &json!("nothing"), None).await;
        assert_eq!(store.get("spam").await.unwrap(), Some(json!("nothing")));

        store.delete("hello").await.unwrap();
        assert_eq!(store.get("hello").await.unwrap(), None);
        store.close().await;
    }

    #[tokio::test]
    async fn cache_set_forwards_expiry_and_set_does_not() {
        let store = store(FlakyStorage::new(0));
        store.cache_set("score", &json!(3.0), Some(Duration::from_secs(60))).await;
        assert_eq!(store.storage().last_expiry.get(), Some(Duration::from_secs(60)));
        store.set("score", &json!(3.0)).await.unwrap();
        assert_eq!(store.storage().last_expiry.get(), None);
        assert_eq!(store.cache_get("score").await, Some(json!(3.0)));
    }
}
