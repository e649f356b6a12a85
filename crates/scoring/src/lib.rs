// Rust guideline compliant 2026-10-16

//! Scoring functions backed by a [`Store`].
//!
//! [`get_score`] derives a score from whichever identity fields are known and
//! memoizes it on the best-effort cache path for an hour. [`get_interests`]
//! reads a client's interest list from the durable path (cache fallback on).

use std::time::Duration;

use chrono::NaiveDate;
use domain::{Gender, Storage, StorageError};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use store::Store;

/// How long a computed score stays cached.
pub const SCORE_TTL: Duration = Duration::from_secs(60 * 60);

const PHONE_WEIGHT: f64 = 1.5;
const EMAIL_WEIGHT: f64 = 1.5;
const BIRTHDAY_GENDER_WEIGHT: f64 = 1.5;
const NAME_WEIGHT: f64 = 0.5;

/// Identity fields a score is computed from. Unset fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreInput<'a> {
    /// Phone number digits.
    pub phone: Option<&'a str>,
    /// Email address.
    pub email: Option<&'a str>,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
    /// Gender code.
    pub gender: Option<Gender>,
    /// Given name.
    pub first_name: Option<&'a str>,
    /// Family name.
    pub last_name: Option<&'a str>,
}

/// Cache key for `input`: `"uid:"` followed by a hex SHA-256 of the name,
/// phone and birthday parts.
#[must_use]
pub fn score_key(input: &ScoreInput<'_>) -> String {
    let birthday = input.birthday.map(|d| d.format("%Y%m%d").to_string()).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(input.first_name.unwrap_or_default());
    hasher.update(input.last_name.unwrap_or_default());
    hasher.update(input.phone.unwrap_or_default());
    hasher.update(birthday);
    format!("uid:{}", hex::encode(hasher.finalize()))
}

/// Weighted sum of the known fields.
#[must_use]
pub fn compute_score(input: &ScoreInput<'_>) -> f64 {
    let mut score = 0.0;
    if input.phone.is_some() {
        score += PHONE_WEIGHT;
    }
    if input.email.is_some() {
        score += EMAIL_WEIGHT;
    }
    if input.birthday.is_some() && input.gender.is_some() {
        score += BIRTHDAY_GENDER_WEIGHT;
    }
    if input.first_name.is_some() && input.last_name.is_some() {
        score += NAME_WEIGHT;
    }
    score
}

/// Score for `input`, served from the cache when a non-zero score is cached.
///
/// Never fails: the cache path is best-effort, so an unreachable store only
/// costs a recomputation.
pub async fn get_score<S: Storage>(store: &Store<S>, input: &ScoreInput<'_>) -> f64 {
    let key = score_key(input);
    if let Some(cached) = store
        .cache_get(&key)
        .await
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|s| s.abs() > f64::EPSILON)
    {
        tracing::debug!(key, score = cached, "scoring.score.cached");
        return cached;
    }
    let score = compute_score(input);
    store.cache_set(&key, &json!(score), Some(SCORE_TTL)).await;
    tracing::debug!(key, score, "scoring.score.computed");
    score
}

/// Interest list of client `cid`, stored under `"i:<cid>"`.
///
/// Anything other than a list of strings (including an absent key) reads
/// as no interests.
///
/// # Errors
///
/// Returns `StorageError::Protocol` when the store replies with garbage;
/// connection failures are absorbed by the cache fallback.
pub async fn get_interests<S: Storage>(store: &Store<S>, cid: i64) -> Result<Vec<String>, StorageError> {
    let interests = match store.get(&interests_key(cid)).await? {
        Some(Value::Array(items)) => items.into_iter().filter_map(|v| v.as_str().map(str::to_owned)).collect(),
        Some(Value::String(text)) => serde_json::from_str(&text).unwrap_or_default(),
        _ => Vec::new(),
    };
    Ok(interests)
}

/// Store key holding the interests of client `cid`.
#[must_use]
pub fn interests_key(cid: i64) -> String {
    format!("i:{cid}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{decode_value, encode_value};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use store::StoreConfig;

    /// Map-backed storage; `down` makes every call fail with a connection error.
    #[derive(Default)]
    struct MapStorage {
        data: RefCell<HashMap<String, String>>,
        expiries: RefCell<HashMap<String, Option<Duration>>>,
        down: Cell<bool>,
    }

    impl MapStorage {
        fn check(&self) -> Result<(), StorageError> {
            if self.down.get() {
                Err(StorageError::ConnectionFailed { reason: "down".to_owned() })
            } else {
                Ok(())
            }
        }
    }

    impl Storage for MapStorage {
        async fn connect(&self) -> Result<(), StorageError> {
            self.check()
        }

        async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            self.check()?;
            Ok(self.data.borrow().get(key).cloned().map(decode_value))
        }

        async fn set(
            &self,
            key: &str,
            value: &Value,
            expires: Option<Duration>,
        ) -> Result<(), StorageError> {
            self.check()?;
            self.data.borrow_mut().insert(key.to_owned(), encode_value(value));
            self.expiries.borrow_mut().insert(key.to_owned(), expires);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.check()?;
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        async fn close(&self) {}
    }

    fn make_store() -> Store<MapStorage> {
        let config = StoreConfig::builder().delay(Duration::ZERO).build().unwrap();
        Store::new(MapStorage::default(), config)
    }

    fn phone_and_email() -> ScoreInput<'static> {
        ScoreInput { phone: Some("79175002040"), email: Some("test@test.ru"), ..ScoreInput::default() }
    }

    #[test]
    fn weights_add_up() {
        assert!((compute_score(&ScoreInput::default())).abs() < f64::EPSILON);
        assert!((compute_score(&phone_and_email()) - 3.0).abs() < f64::EPSILON);
        let full = ScoreInput {
            birthday: NaiveDate::from_ymd_opt(2000, 1, 1),
            gender: Some(Gender::Female),
            first_name: Some("a"),
            last_name: Some("b"),
            ..phone_and_email()
        };
        assert!((compute_score(&full) - 5.0).abs() < f64::EPSILON);
        // Half a pair counts for nothing.
        let half = ScoreInput { first_name: Some("a"), ..ScoreInput::default() };
        assert!(compute_score(&half).abs() < f64::EPSILON);
    }

    #[test]
    fn score_key_depends_on_identity_parts_only() {
        let a = score_key(&phone_and_email());
        let b = score_key(&ScoreInput { email: None, ..phone_and_email() });
        let c = score_key(&ScoreInput { phone: Some("79175002041"), ..phone_and_email() });
        assert!(a.starts_with("uid:"));
        assert_eq!(a.len(), "uid:".len() + 64);
        assert_eq!(a, b, "email is not part of the key");
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn score_is_cached_for_an_hour() {
        let store = make_store();
        let input = phone_and_email();
        let score = get_score(&store, &input).await;
        assert!((score - 3.0).abs() < f64::EPSILON);
        let key = score_key(&input);
        assert_eq!(store.storage().expiries.borrow()[&key], Some(SCORE_TTL));
    }

    #[tokio::test]
    async fn cached_score_wins() {
        let store = make_store();
        let input = phone_and_email();
        store.cache_set(&score_key(&input), &json!(9.5), None).await;
        assert!((get_score(&store, &input).await - 9.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn score_survives_store_outage() {
        let store = make_store();
        store.storage().down.set(true);
        assert!((get_score(&store, &phone_and_email()).await - 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn interests_read_from_store() {
        let store = make_store();
        store.set(&interests_key(1), &json!(["cars", "pets"])).await.unwrap();
        store.set(&interests_key(2), &json!("not a list")).await.unwrap();
        assert_eq!(get_interests(&store, 1).await.unwrap(), ["cars", "pets"]);
        assert!(get_interests(&store, 2).await.unwrap().is_empty());
        assert!(get_interests(&store, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn interests_empty_when_store_is_down() {
        let store = make_store();
        store.set(&interests_key(1), &json!(["cars"])).await.unwrap();
        store.storage().down.set(true);
        assert_eq!(get_interests(&store, 1).await, Ok(Vec::new()));
    }
}
