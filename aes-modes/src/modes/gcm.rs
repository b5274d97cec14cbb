//! GCM (Galois/Counter Mode) authenticated encryption
//!
//! GCM is not rebuilt block by block here: sealing and opening go through the
//! `aes-gcm` crate (AES-256, 96-bit IV, 128-bit tag) using its detached API so
//! that the tag travels as its own envelope field.
//!
//! Opening verifies the tag before any plaintext is handed out. A mismatch
//! anywhere (IV, tag, associated data or ciphertext) yields the same
//! [`CipherModeError::AuthenticationFailed`]; the comparison itself is
//! constant-time inside `aes-gcm`.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use tracing::warn;
use zeroize::Zeroize;

use crate::block;
use crate::error::{CipherModeError, Result};
use crate::kdf::Key;
use crate::trace::{Stage, TraceSink};

use super::CipherModes;

/// Size of the GCM IV in bytes
pub const IV_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

fn gcm_cipher(key: &Key) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CipherModeError::CryptoPrimitive("AES-256-GCM rejected the key".to_string()))
}

/// Encrypt and authenticate. Returns `(ciphertext, tag)`.
pub fn seal(
    key: &Key,
    iv: &[u8; IV_SIZE],
    plaintext: &[u8],
    associated_data: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_SIZE])> {
    let cipher = gcm_cipher(key)?;
    let mut buffer = plaintext.to_vec();

    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(iv), associated_data, &mut buffer)
        .map_err(|_| CipherModeError::CryptoPrimitive("AES-256-GCM encryption failed".to_string()))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);
    Ok((buffer, tag_bytes))
}

/// Verify the tag and decrypt, failing closed.
///
/// On failure the working buffer is wiped before the error is returned, so
/// no partially decrypted bytes survive the call.
pub fn verify_and_decrypt(
    key: &Key,
    iv: &[u8; IV_SIZE],
    tag: &[u8; TAG_SIZE],
    ciphertext: &[u8],
    associated_data: &[u8],
) -> Result<Vec<u8>> {
    let cipher = gcm_cipher(key)?;
    let mut buffer = ciphertext.to_vec();

    match cipher.decrypt_in_place_detached(
        Nonce::from_slice(iv),
        associated_data,
        &mut buffer,
        Tag::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            warn!(ciphertext_len = ciphertext.len(), "GCM tag verification failed");
            Err(CipherModeError::AuthenticationFailed)
        }
    }
}

impl CipherModes {
    /// GCM encryption with trace recording.
    ///
    /// GCM's internal keystream is not exposed, so the trace shows the
    /// header material plus plaintext/ciphertext pairs per 16-byte segment.
    pub fn gcm_encrypt<T: TraceSink>(
        key: &Key,
        plaintext: &[u8],
        iv: &[u8; IV_SIZE],
        associated_data: &[u8],
        trace: &mut T,
    ) -> Result<(Vec<u8>, [u8; TAG_SIZE])> {
        trace.record(Stage::InitializationVector, 0, iv);
        trace.record(Stage::AssociatedData, 0, associated_data);

        let (ciphertext, tag) = seal(key, iv, plaintext, associated_data)?;

        for (i, (p, c)) in block::segment(plaintext).zip(block::segment(&ciphertext)).enumerate() {
            trace.record(Stage::PlaintextBlock, i + 1, p);
            trace.record(Stage::CiphertextBlock, i + 1, c);
        }
        trace.record(Stage::AuthenticationTag, 0, &tag);

        Ok((ciphertext, tag))
    }

    /// GCM decryption with trace recording.
    ///
    /// Plaintext entries are only recorded once the tag has verified.
    pub fn gcm_decrypt<T: TraceSink>(
        key: &Key,
        ciphertext: &[u8],
        iv: &[u8; IV_SIZE],
        tag: &[u8; TAG_SIZE],
        associated_data: &[u8],
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        trace.record(Stage::InitializationVector, 0, iv);
        trace.record(Stage::AuthenticationTag, 0, tag);
        trace.record(Stage::AssociatedData, 0, associated_data);
        for (i, c) in block::segment(ciphertext).enumerate() {
            trace.record(Stage::CiphertextBlock, i + 1, c);
        }

        let plaintext = verify_and_decrypt(key, iv, tag, ciphertext, associated_data)?;

        for (i, p) in block::segment(&plaintext).enumerate() {
            trace.record(Stage::PlaintextBlock, i + 1, p);
        }

        Ok(plaintext)
    }
}
