//! Local purchase cache.
//!
//! Holds, per user, the snippet ids the client knows were purchased. It is a
//! fast-path allow-list in front of the remote authority, never a deny-list:
//! an id missing here only means "ask the authority".

use crate::access::store::KeyValueStore;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of the per-user store key.
const KEY_PREFIX: &str = "purchasedSnippets:";

/// Store key holding the purchase list of `user_id`.
#[must_use]
pub fn storage_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}{user_id}")
}

/// Per-user allow-list of purchased snippets.
#[derive(Clone)]
pub struct LocalPurchaseCache {
    store: Arc<dyn KeyValueStore>,
    stats: Arc<Mutex<CacheStats>>,
}

/// Cache statistics for monitoring.
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of purchases recorded.
    pub additions: u64,
    /// Number of malformed entries read back as empty.
    pub corrupt_reads: u64,
}

impl CacheStats {
    /// Calculate hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl LocalPurchaseCache {
    /// Create a cache over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    /// All snippet ids recorded for `user_id`.
    ///
    /// A missing entry and a malformed entry both read as an empty list.
    /// Non-string elements of a stored array are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying store cannot be read.
    pub fn purchased(&self, user_id: &str) -> Result<Vec<String>> {
        let ids = self
            .load_entries(user_id)?
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect();
        Ok(ids)
    }

    /// Raw elements of the stored array for `user_id`.
    fn load_entries(&self, user_id: &str) -> Result<Vec<Value>> {
        let key = storage_key(user_id);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => {
                if entries.iter().any(|entry| !entry.is_string()) {
                    warn!("Purchase cache entry {key} holds non-string elements");
                }
                Ok(entries)
            }
            Err(e) => {
                warn!("Ignoring malformed purchase cache entry {key}: {e}");
                self.stats.lock().corrupt_reads += 1;
                Ok(Vec::new())
            }
        }
    }

    /// Check if `user_id` is locally known to own `snippet_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    pub fn contains(&self, user_id: &str, snippet_id: &str) -> Result<bool> {
        let found = self.purchased(user_id)?.iter().any(|id| id == snippet_id);

        let mut stats = self.stats.lock();
        if found {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        drop(stats);

        debug!(
            "Purchase cache {} for {user_id}/{snippet_id}",
            if found { "hit" } else { "miss" }
        );
        Ok(found)
    }

    /// Record that `user_id` purchased `snippet_id`.
    ///
    /// Entries are never removed and duplicates are ignored, so recording the
    /// same pair again is a no-op. Returns `true` if the id was newly added.
    ///
    /// # Errors
    ///
    /// Returns an error if either id is empty or the store cannot be
    /// read or written.
    pub fn record(&self, snippet_id: &str, user_id: &str) -> Result<bool> {
        if snippet_id.trim().is_empty() {
            return Err(Error::InvalidSnippet("empty snippet id".to_string()));
        }
        if user_id.trim().is_empty() {
            return Err(Error::InvalidIdentity("empty user id".to_string()));
        }

        // Unknown elements are written back untouched
        let mut entries = self.load_entries(user_id)?;
        if entries.iter().any(|entry| entry.as_str() == Some(snippet_id)) {
            debug!("Purchase {user_id}/{snippet_id} already recorded");
            return Ok(false);
        }

        entries.push(Value::String(snippet_id.to_string()));
        let encoded = serde_json::to_string(&entries)?;
        self.store.set(&storage_key(user_id), &encoded)?;

        self.stats.lock().additions += 1;
        info!("Recorded local purchase {user_id}/{snippet_id}");
        Ok(true)
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }
}
