//! # AES Modes Library
//!
//! AES-256 under the classic modes of operation, with every intermediate
//! cryptographic state available for visualization.
//!
//! ## Supported Modes
//!
//! - **ECB** (Electronic Code Book) - Simple but insecure mode, PKCS#7 padded
//! - **CBC** (Cipher Block Chaining) - Widely used, requires IV, PKCS#7 padded
//! - **CTR** (Counter Mode) - Stream cipher mode, 12-byte nonce + 32-bit counter
//! - **CFB** (Cipher Feedback) - Stream cipher mode, ciphertext fed back
//! - **OFB** (Output Feedback) - Stream cipher mode, keystream fed back
//! - **GCM** (Galois/Counter Mode) - Authenticated encryption
//!
//! ## Usage
//!
//! ```rust
//! use aes_modes::{decrypt, encrypt};
//!
//! let encrypted = encrypt("HELLO WORLD", "mykey123", "CBC")?;
//! // IV:CIPHERTEXT, both hex
//! assert_eq!(encrypted.envelope.split(':').count(), 2);
//!
//! let decrypted = decrypt(&encrypted.envelope, "mykey123", "CBC")?;
//! assert_eq!(decrypted.text(), Some("HELLO WORLD"));
//! # Ok::<(), aes_modes::CipherModeError>(())
//! ```
//!
//! Keys are a single SHA-256 of the passphrase, with no salt and no
//! stretching: the same passphrase always yields the same key.

// Public modules
pub mod block;
pub mod cipher;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod modes;
pub mod payload;
pub mod trace;

// Re-exports for easy access
pub use cipher::{Aes256Cipher, BlockCipher, FixedNonce, NonceSource, OsRandom};
pub use engine::{Decrypted, Encrypted, Engine, DEFAULT_ASSOCIATED_DATA};
pub use envelope::Envelope;
pub use error::{CipherModeError, Result};
pub use kdf::{derive_key, generate_passphrase, Key};
pub use modes::{CipherModes, Mode};
pub use trace::{Stage, Trace, TraceEntry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encrypt with the default engine, returning the envelope and its trace.
///
/// `mode` is matched case-insensitively against ECB, CBC, CTR, CFB, OFB
/// and GCM.
pub fn encrypt(plaintext: impl AsRef<[u8]>, passphrase: &str, mode: &str) -> Result<Encrypted> {
    let mode: Mode = mode.parse()?;
    Engine::default().encrypt_traced(plaintext.as_ref(), passphrase, mode)
}

/// Decrypt with the default engine, returning the plaintext and its trace.
pub fn decrypt(envelope: &str, passphrase: &str, mode: &str) -> Result<Decrypted> {
    let mode: Mode = mode.parse()?;
    Engine::default().decrypt_traced(envelope, passphrase, mode)
}

/// Convenience functions for common operations
impl CipherModes {
    /// Get version information
    pub fn version() -> &'static str {
        VERSION
    }

    /// List all supported cipher modes
    pub fn supported_modes() -> Vec<&'static str> {
        Mode::ALL.iter().map(|mode| mode.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_modes_integration() {
        let plaintext = b"Integration test message for all modes!";

        for mode in CipherModes::supported_modes() {
            let encrypted = encrypt(plaintext, "test-key", mode).unwrap();
            let decrypted = decrypt(&encrypted.envelope, "test-key", mode).unwrap();
            assert_eq!(plaintext, &decrypted.plaintext[..], "{mode}");
        }
    }

    #[test]
    fn test_mode_names_are_case_insensitive() {
        let encrypted = encrypt("hello", "k", "ofb").unwrap();
        assert_eq!(decrypt(&encrypted.envelope, "k", "OFB").unwrap().text(), Some("hello"));
    }

    #[test]
    fn test_unsupported_mode() {
        assert_eq!(
            encrypt("hello", "k", "XTS").unwrap_err(),
            CipherModeError::UnsupportedMode("XTS".to_string())
        );
        assert!(matches!(
            decrypt("00", "k", "rot13"),
            Err(CipherModeError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn test_ecb_is_deterministic() {
        let first = encrypt([0u8; 16], "k", "ECB").unwrap();
        let second = encrypt([0u8; 16], "k", "ECB").unwrap();
        assert_eq!(first.envelope, second.envelope);
    }

    #[test]
    fn test_gcm_tamper_scenario() {
        let encrypted = encrypt("test", "k", "GCM").unwrap();
        assert_eq!(encrypted.envelope.split(':').count(), 3);

        let tampered = envelope::tamper(&encrypted.envelope).unwrap();
        assert_eq!(
            decrypt(&tampered, "k", "GCM").unwrap_err(),
            CipherModeError::AuthenticationFailed
        );
    }

    #[test]
    fn test_cipher_modes_metadata() {
        assert_eq!(
            CipherModes::supported_modes(),
            vec!["ECB", "CBC", "CTR", "CFB", "OFB", "GCM"]
        );
        assert!(!CipherModes::version().is_empty());
    }

    #[test]
    fn test_trace_serializes_for_visualizer() {
        let encrypted = encrypt("HELLO", "k", "CTR").unwrap();
        let json = serde_json::to_value(&encrypted.trace).unwrap();

        assert_eq!(json[0]["stage"], "Nonce");
        assert_eq!(json[0]["blockIndex"], 0);
        assert_eq!(json[1]["stage"], "Plaintext Block");
        assert_eq!(json[1]["textData"], "HELLO");
    }
}
