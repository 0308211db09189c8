use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::db::executor::DecimalsStore;
use crate::entity_id::EntityId;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-wide token id to decimals cache.
///
/// Decimals never change once a token exists, so entries are only dropped by
/// LRU eviction when the cache is full. Tokens missing from the store are not
/// remembered, so a later lookup will query for them again.
///
/// The mutex is only held for in-memory work; the store fetch in
/// [`resolve_batch`](Self::resolve_batch) runs without it. Two callers missing
/// on the same token at the same time may both fetch it.
#[derive(Debug)]
pub struct TokenDecimalsCache {
    entries: Mutex<LruCache<EntityId, i64>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TokenDecimalsCache {
    pub fn new(max_size: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(max_size)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, token_id: &EntityId) -> Option<i64> {
        self.entries.lock().get(token_id).copied()
    }

    pub fn put(&self, token_id: EntityId, decimals: i64) {
        if let Some((evicted, _)) = self.entries.lock().push(token_id, decimals) {
            if evicted != token_id {
                debug!(token_id = %evicted, "Evicted token decimals from cache");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Resolve decimals for every id, fetching all misses from `store` in a
    /// single call. Ids the store does not know are left out of the result.
    #[instrument(skip(self, store, token_ids), fields(requested = token_ids.len()))]
    pub async fn resolve_batch<S>(
        &self,
        store: &S,
        token_ids: &HashSet<EntityId>,
    ) -> Result<HashMap<EntityId, i64>>
    where
        S: DecimalsStore,
    {
        let mut resolved = HashMap::with_capacity(token_ids.len());
        let mut uncached = Vec::new();
        {
            let mut entries = self.entries.lock();
            for token_id in token_ids {
                match entries.get(token_id) {
                    Some(decimals) => {
                        resolved.insert(*token_id, *decimals);
                    }
                    None => uncached.push(*token_id),
                }
            }
        }

        self.hits.fetch_add(resolved.len() as u64, Ordering::Relaxed);
        self.misses.fetch_add(uncached.len() as u64, Ordering::Relaxed);

        if uncached.is_empty() {
            debug!(hits = resolved.len(), "All token decimals served from cache");
            return Ok(resolved);
        }

        // Stable order keeps the fetch parameter deterministic.
        uncached.sort_unstable();
        let rows = store.fetch_decimals(&uncached).await?;
        debug!(
            hits = resolved.len(),
            fetched = uncached.len(),
            found = rows.len(),
            "Fetched uncached token decimals"
        );

        for row in rows {
            let token_id = EntityId::from_encoded(row.token_id);
            self.put(token_id, row.decimals);
            resolved.insert(token_id, row.decimals);
        }

        Ok(resolved)
    }
}
