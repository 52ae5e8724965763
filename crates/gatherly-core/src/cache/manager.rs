use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::ApiError;
use crate::DEFAULT_STALE_MINUTES;

use super::QueryKey;

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    /// Set by `invalidate`; the data stays readable until the refetch lands.
    pub invalidated: bool,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
            invalidated: false,
        }
    }

    pub fn is_stale(&self, stale_after: Duration) -> bool {
        self.invalidated || Utc::now() - self.cached_at > stale_after
    }
}

/// Process-wide keyed cache of server responses.
///
/// Entries hold raw JSON so one cache can serve every query type. Reads of
/// a snapshot never hit the network; `fetch` refetches missing, stale or
/// invalidated entries. No lock is held across an `.await`.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CachedData<Value>>>,
    stale_after: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_STALE_MINUTES))
    }
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_after,
        }
    }

    /// Current snapshot for `key`, fresh or not.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let cached = entries.get(key)?;
        match serde_json::from_value(cached.data.clone()) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(key = %key, error = %e, "Cached value does not match requested type");
                None
            }
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(key)
    }

    /// True when `key` has data that can be served without a refetch.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .map(|cached| !cached.is_stale(self.stale_after))
            .unwrap_or(false)
    }

    pub fn set(&self, key: QueryKey, data: Value) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, CachedData::new(data));
    }

    /// Return the cached value for `key` if fresh, otherwise run `fetcher`,
    /// store its result and return that. Fetch failures leave the cache as is.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        if self.is_fresh(key) {
            if let Some(data) = self.get(key) {
                debug!(key = %key, "Query cache hit");
                return Ok(data);
            }
        }

        debug!(key = %key, "Query cache miss, fetching");
        let value = fetcher().await?;
        let data = serde_json::from_value(value.clone())?;
        self.set(key.clone(), value);
        Ok(data)
    }

    /// Mark every entry under `prefix` stale. Returns how many were marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut count = 0;
        for (key, cached) in entries.iter_mut() {
            if key.starts_with(prefix) {
                cached.invalidated = true;
                count += 1;
            }
        }
        debug!(prefix = %prefix, count = count, "Invalidated cached queries");
        count
    }

    /// Drop every entry, e.g. when the user signs out.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &QueryKey, minutes: i64) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entries.get_mut(key) {
            cached.cached_at = Utc::now() - Duration::minutes(minutes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(segments: &[&str]) -> QueryKey {
        QueryKey::new(segments.iter().copied())
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale(Duration::minutes(5)));

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(6);
        assert!(old.is_stale(Duration::minutes(5)));

        let mut invalidated = CachedData::new(vec![1]);
        invalidated.invalidated = true;
        assert!(invalidated.is_stale(Duration::minutes(5)));
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let cache = QueryCache::default();
        cache.set(key(&["users", "3", "work"]), json!([]));
        cache.set(key(&["users", "5", "work"]), json!([]));
        cache.set(key(&["work", "7"]), json!({}));
        cache.set(key(&["work", "70"]), json!({}));

        assert_eq!(cache.invalidate(&key(&["work", "7"])), 1);
        assert!(!cache.is_fresh(&key(&["work", "7"])));
        assert!(cache.is_fresh(&key(&["work", "70"])));

        assert_eq!(cache.invalidate(&key(&["users"])), 2);
        assert!(!cache.is_fresh(&key(&["users", "5", "work"])));
    }

    #[test]
    fn test_invalidated_snapshot_still_readable() {
        let cache = QueryCache::default();
        let k = key(&["user", "saved-events"]);
        cache.set(k.clone(), json!([{"id": 1}]));
        cache.invalidate(&k);

        let ids: Option<Vec<serde_json::Value>> = cache.get(&k);
        assert_eq!(ids.map(|v| v.len()), Some(1));
    }

    #[tokio::test]
    async fn test_fetch_uses_fresh_entry() {
        let cache = QueryCache::default();
        let k = key(&["events"]);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<i64> = cache
                .fetch(&k, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([1, 2]))
                })
                .await
                .expect("fetch should succeed");
            assert_eq!(value, vec![1, 2]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.backdate(&k, DEFAULT_STALE_MINUTES + 1);
        let _: Vec<i64> = cache
            .fetch(&k, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!([1, 2, 3]))
            })
            .await
            .expect("fetch should succeed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_entry() {
        let cache = QueryCache::default();
        let k = key(&["places"]);
        cache.set(k.clone(), json!([4]));
        cache.invalidate(&k);

        let result: Result<Vec<i64>, ApiError> = cache
            .fetch(&k, || async { Err(ApiError::Network("offline".to_string())) })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get::<Vec<i64>>(&k), Some(vec![4]));
    }

    #[test]
    fn test_clear() {
        let cache = QueryCache::default();
        cache.set(key(&["user", "preferences"]), json!({}));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
