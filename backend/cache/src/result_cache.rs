use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scanforge_guard::PayloadCodec;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::memory::MemoryStore;
use crate::store::{CacheEntry, CacheStore, SqliteStore};

/// Content-addressed result cache.
///
/// Fronts a durable store and degrades to an in-process map on any
/// backend failure; callers never observe a cache error, only a miss.
/// Sensitive payloads pass through the guard codec on `put` and are
/// decoded transparently on `get`.
pub struct ResultCache {
    primary: Box<dyn CacheStore>,
    fallback: MemoryStore,
    codec: PayloadCodec,
}

impl ResultCache {
    /// Open the durable store at `path`, degrading to in-memory when the
    /// backend is unavailable.
    pub fn open(path: &str, codec: PayloadCodec) -> Self {
        match SqliteStore::open(path) {
            Ok(store) => Self::with_store(Box::new(store), codec),
            Err(e) => {
                warn!(path, error = %e, "cache backend unavailable, using in-memory fallback");
                Self::in_memory(codec)
            }
        }
    }

    /// Purely in-process cache (fallback mode and tests).
    pub fn in_memory(codec: PayloadCodec) -> Self {
        Self::with_store(Box::new(MemoryStore::new()), codec)
    }

    pub fn with_store(primary: Box<dyn CacheStore>, codec: PayloadCodec) -> Self {
        Self {
            primary,
            fallback: MemoryStore::new(),
            codec,
        }
    }

    /// Look up a fingerprint, decoding stored payloads transparently.
    pub fn get(&self, fingerprint: &str) -> Option<Vec<u8>> {
        let entry = match self.primary.get(fingerprint) {
            Ok(found) => found,
            Err(e) => {
                warn!(fingerprint, error = %e, "primary cache read failed, trying fallback");
                self.fallback.get(fingerprint).ok().flatten()
            }
        }?;
        Some(self.codec.decode(&entry.payload))
    }

    /// Store a payload under a fingerprint.
    ///
    /// A re-put of an identical payload is a no-op (the entry keeps its
    /// original TTL); a different payload overwrites and resets the TTL.
    /// Sensitive payloads are guard-encoded before they touch storage.
    pub fn put(&self, fingerprint: &str, payload: &[u8], ttl: Duration, sensitive: bool) {
        if let Some(existing) = self.get(fingerprint) {
            if existing == payload {
                debug!(fingerprint, "identical payload already cached");
                return;
            }
        }

        let stored = if sensitive {
            match self.codec.encode(payload) {
                Ok(encoded) => encoded,
                Err(e) => {
                    // Never write sensitive material unencoded.
                    warn!(fingerprint, error = %e, "encoding failed, entry not cached");
                    return;
                }
            }
        } else {
            payload.to_vec()
        };

        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            payload: stored,
            created_at: Utc::now(),
            ttl_secs: ttl.as_secs(),
        };

        if let Err(e) = self.primary.put(entry.clone()) {
            warn!(fingerprint, error = %e, "primary cache write failed, using fallback");
            if let Err(e) = self.fallback.put(entry) {
                warn!(fingerprint, error = %e, "fallback cache write failed");
            }
        }
    }

    pub fn invalidate(&self, fingerprint: &str) {
        if let Err(e) = self.primary.invalidate(fingerprint) {
            warn!(fingerprint, error = %e, "primary cache invalidation failed");
        }
        let _ = self.fallback.invalidate(fingerprint);
    }

    /// Run one active expiry sweep across both stores.
    pub fn sweep(&self) {
        if let Err(e) = self.primary.sweep() {
            warn!(error = %e, "cache sweep failed");
        }
        let _ = self.fallback.sweep();
    }

    /// Spawn the periodic sweeper that bounds memory growth between reads.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        })
    }
}
