use sha2::{Digest, Sha256};

/// Deterministic content fingerprint of the canonical input bytes,
/// used as the cache key for one uploaded image.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
