// Rust guideline compliant 2026-10-18

//! Adapters (secondary ports) for the scoring API binary.
//!
//! Each sub-module implements the `Storage` port defined in the `domain`
//! crate. [`Backend`] picks one at startup so the HTTP layer stays
//! monomorphic.

pub mod in_memory_storage;
pub mod redis_storage;

use std::time::Duration;

use domain::{Storage, StorageError};
use serde_json::Value;

use in_memory_storage::InMemoryStorage;
use redis_storage::RedisStorage;

/// The storage adapter selected on the command line.
#[derive(Debug)]
pub enum Backend {
    /// Redis server over RESP2.
    Redis(RedisStorage),
    /// Process-local map (`--in-memory`).
    Memory(InMemoryStorage),
}

impl Backend {
    /// Short adapter name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "in-memory",
        }
    }
}

impl Storage for Backend {
    async fn connect(&self) -> Result<(), StorageError> {
        match self {
            Self::Redis(s) => s.connect().await,
            Self::Memory(s) => s.connect().await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self {
            Self::Redis(s) => s.get(key).await,
            Self::Memory(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &Value, expires: Option<Duration>) -> Result<(), StorageError> {
        match self {
            Self::Redis(s) => s.set(key, value, expires).await,
            Self::Memory(s) => s.set(key, value, expires).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Redis(s) => s.delete(key).await,
            Self::Memory(s) => s.delete(key).await,
        }
    }

    async fn close(&self) {
        match self {
            Self::Redis(s) => s.close().await,
            Self::Memory(s) => s.close().await,
        }
    }
}
