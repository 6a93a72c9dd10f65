pub mod fingerprint;
pub mod memory;
pub mod result_cache;
pub mod store;

pub use fingerprint::fingerprint;
pub use memory::MemoryStore;
pub use result_cache::ResultCache;
pub use store::{CacheEntry, CacheError, CacheStore, SqliteStore};
