// Rust guideline compliant 2026-10-18

//! In-memory adapter for the `Storage` port.
//!
//! Intended for local runs (`--in-memory`) and tests. Keys expire lazily: an
//! expired entry is dropped when it is next read. Never returns an error.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use domain::{Storage, StorageError, decode_value, encode_value};
use serde_json::Value;

#[derive(Debug)]
struct Entry {
    text: String,
    deadline: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

/// `Storage` adapter backed by a `HashMap` with per-key expiry.
///
/// Values go through the same text codec as the network adapter, so reads
/// return what a real store would.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, expired ones included until they are read.
    #[cfg(test)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for InMemoryStorage {
    async fn connect(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let now = Instant::now();
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| decode_value(e.text.clone())))
    }

    async fn set(&self, key: &str, value: &Value, expires: Option<Duration>) -> Result<(), StorageError> {
        let entry = Entry { text: encode_value(value), deadline: expires.map(|ttl| Instant::now() + ttl) };
        self.entries().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    async fn close(&self) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
