//! Key derivation: passphrase → 256-bit AES key
//!
//! One SHA-256 pass over the UTF-8 bytes of the passphrase. There is no salt
//! and no iteration count, so equal passphrases always give equal keys and
//! weak passphrases are cheap to brute-force. Envelopes already in the
//! wild depend on exactly this derivation.

use rand::{rngs::OsRng, RngCore};
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CipherModeError, Result};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// A 256-bit AES key.
///
/// Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Key {
    bytes: [u8; KEY_SIZE],
}

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the working key from a passphrase.
pub fn derive_key(passphrase: &str) -> Result<Key> {
    if passphrase.is_empty() {
        return Err(CipherModeError::InvalidKey("passphrase cannot be empty"));
    }

    let mut bytes = [0u8; KEY_SIZE];
    Sha256::new()
        .chain_update(passphrase.as_bytes())
        .finalize_into(GenericArray::from_mut_slice(&mut bytes));

    let key = Key::from_bytes(bytes);
    bytes.zeroize();
    Ok(key)
}

/// Generate a random passphrase: 32 CSPRNG bytes as 64 lowercase hex digits.
pub fn generate_passphrase() -> String {
    let mut raw = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut raw);
    let passphrase = hex::encode(raw);
    raw.zeroize();
    passphrase
}
