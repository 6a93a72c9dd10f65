//! Reversible encoding of sensitive payloads before storage.
//!
//! AES-256-GCM with a random nonce, framed as `SFG1 || nonce || ciphertext`.
//! Buffers without the frame tag are treated as legacy plaintext, and so is
//! anything that fails to authenticate; a format migration must never make
//! previously stored extractions unreadable mid-request.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

pub const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;
const MAGIC: &[u8; 4] = b"SFG1";
// Frame tag + nonce + minimum AES-GCM auth tag.
const MIN_ENCODED_LEN: usize = MAGIC.len() + NONCE_LENGTH + 16;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("payload encoding failed")]
    Encode,
}

/// Keyed transform applied to sensitive cache entries.
#[derive(Clone)]
pub struct PayloadCodec {
    key: [u8; KEY_LENGTH],
}

impl PayloadCodec {
    pub fn new(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Derive the storage key from a configured passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Encrypt a payload into the framed wire form.
    pub fn encode(&self, plaintext: &[u8]) -> Result<Vec<u8>, GuardError> {
        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| GuardError::Encode)?;

        let mut out = Vec::with_capacity(MIN_ENCODED_LEN + ciphertext.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decode a stored payload.
    ///
    /// Unframed input passes through as legacy plaintext. Framed input
    /// that fails to authenticate also degrades to the raw bytes rather
    /// than aborting the request; the caller's parse step decides what to
    /// do with it.
    pub fn decode(&self, bytes: &[u8]) -> Vec<u8> {
        if !bytes.starts_with(MAGIC) {
            return bytes.to_vec();
        }
        if bytes.len() < MIN_ENCODED_LEN {
            warn!(len = bytes.len(), "framed payload too short, treating as plaintext");
            return bytes.to_vec();
        }

        let nonce = Nonce::from_slice(&bytes[MAGIC.len()..MAGIC.len() + NONCE_LENGTH]);
        let ciphertext = &bytes[MAGIC.len() + NONCE_LENGTH..];

        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);
        match cipher.decrypt(nonce, ciphertext) {
            Ok(plaintext) => plaintext,
            Err(_) => {
                warn!("payload failed to authenticate, treating as plaintext");
                bytes.to_vec()
            }
        }
    }
}
