//! Block cipher and randomness primitives the modes are written against

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use rand::{rngs::OsRng, RngCore};

use crate::block::{Block, BLOCK_SIZE};
use crate::error::{CipherModeError, Result};
use crate::kdf::Key;

/// Trait for a keyed 128-bit block cipher
pub trait BlockCipher {
    /// Encrypts a single block
    fn encrypt_block(&self, block: &Block) -> Block;

    /// Decrypts a single block
    fn decrypt_block(&self, block: &Block) -> Block;
}

/// AES-256 backed by the RustCrypto `aes` crate
#[derive(Clone)]
pub struct Aes256Cipher {
    inner: Aes256,
}

impl Aes256Cipher {
    pub fn new(key: &Key) -> Self {
        Self {
            inner: Aes256::new(GenericArray::from_slice(key.as_bytes())),
        }
    }

    /// Build from raw key bytes; anything but 32 bytes is rejected.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        let inner = Aes256::new_from_slice(key).map_err(|_| {
            CipherModeError::CryptoPrimitive(format!(
                "AES-256 needs a 32-byte key, got {} bytes",
                key.len()
            ))
        })?;
        Ok(Self { inner })
    }
}

impl BlockCipher for Aes256Cipher {
    fn encrypt_block(&self, block: &Block) -> Block {
        let mut buf = GenericArray::clone_from_slice(block);
        self.inner.encrypt_block(&mut buf);
        let mut out = [0u8; BLOCK_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    fn decrypt_block(&self, block: &Block) -> Block {
        let mut buf = GenericArray::clone_from_slice(block);
        self.inner.decrypt_block(&mut buf);
        let mut out = [0u8; BLOCK_SIZE];
        out.copy_from_slice(&buf);
        out
    }
}

/// Source of IV and nonce bytes.
///
/// Reusing an (IV, key) pair across messages is the caller's problem: nothing
/// here can detect it. With GCM a repeat leaks the authentication key.
pub trait NonceSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// Operating-system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl NonceSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// Replays a fixed byte string, for known-answer tests only.
#[derive(Debug, Clone)]
pub struct FixedNonce(pub Vec<u8>);

impl NonceSource for FixedNonce {
    fn fill(&self, buf: &mut [u8]) {
        for (dst, src) in buf.iter_mut().zip(self.0.iter().cycle()) {
            *dst = *src;
        }
    }
}

/// Transparent cipher for testing the modes: XOR with a repeating key.
///
/// Its output is easy to predict by hand, which makes the chaining and
/// counter construction of each mode directly observable.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct DummyCipher {
    key: Block,
}

#[cfg(test)]
impl DummyCipher {
    pub(crate) fn new(key: &[u8]) -> Self {
        let mut block = [0u8; BLOCK_SIZE];
        for (dst, src) in block.iter_mut().zip(key.iter().cycle()) {
            *dst = *src;
        }
        Self { key: block }
    }
}

#[cfg(test)]
impl BlockCipher for DummyCipher {
    fn encrypt_block(&self, block: &Block) -> Block {
        crate::block::xor_blocks(block, &self.key)
    }

    fn decrypt_block(&self, block: &Block) -> Block {
        crate::block::xor_blocks(block, &self.key)
    }
}
