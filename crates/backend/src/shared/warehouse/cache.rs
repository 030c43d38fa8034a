use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<V> {
    fetched_at: Instant,
    value: Arc<V>,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

/// Time-to-live cache of query snapshots keyed by the query fingerprint
///
/// Each key has its own async lock, so concurrent callers asking for the same
/// query wait for a single fetch instead of hitting the warehouse twice.
pub struct QueryCache<V> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Send + Sync> QueryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// SHA-256 hex digest of the query text
    pub fn fingerprint(query: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Return the cached snapshot for `query`, or run `fetch` and cache its result
    ///
    /// Errors are returned to the caller and never cached.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, query: &str, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = Self::fingerprint(query);
        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                tracing::debug!("Query cache hit: {}", &key[..12]);
                return Ok(Arc::clone(&cached.value));
            }
            tracing::debug!("Query cache entry expired: {}", &key[..12]);
        }

        let value = Arc::new(fetch().await?);
        *entry = Some(CacheEntry {
            fetched_at: Instant::now(),
            value: Arc::clone(&value),
        });
        Ok(value)
    }

    /// Drop every snapshot; returns how many keys were cached
    pub fn invalidate_all(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let count = slots.len();
        slots.clear();
        count
    }

    fn slot(&self, key: &str) -> Slot<V> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            slots
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None))),
        )
    }
}
