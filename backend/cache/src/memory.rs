use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use crate::store::{CacheEntry, CacheError, CacheStore};

struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Duration::from_secs(value.ttl_secs))
    }
}

/// In-process fallback store with the same TTL semantics as the durable
/// backend; only durability differs.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(10_000)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.cache.get(fingerprint))
    }

    fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.cache.insert(entry.fingerprint.clone(), entry);
        Ok(())
    }

    fn invalidate(&self, fingerprint: &str) -> Result<(), CacheError> {
        self.cache.invalidate(fingerprint);
        Ok(())
    }

    fn sweep(&self) -> Result<(), CacheError> {
        self.cache.run_pending_tasks();
        Ok(())
    }
}
