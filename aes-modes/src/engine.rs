//! Passphrase-level encrypt/decrypt over every mode
//!
//! [`Engine`] ties the pieces together: key derivation, a fresh IV or nonce
//! per message, the mode transform and the wire envelope. The plain
//! `encrypt`/`decrypt` pair records nothing; the `_traced` pair runs the
//! exact same path with a [`Trace`] sink and hands the entries back.

use std::fmt;

use tracing::debug;

use crate::block::Block;
use crate::cipher::{Aes256Cipher, NonceSource, OsRandom};
use crate::envelope::{self, Envelope};
use crate::error::{CipherModeError, Result};
use crate::kdf::derive_key;
use crate::modes::ctr::NONCE_SIZE;
use crate::modes::gcm::{IV_SIZE, TAG_SIZE};
use crate::modes::{CipherModes, Mode};
use crate::trace::{Discard, Stage, Trace, TraceEntry, TraceSink};

/// Associated data bound into every GCM tag unless overridden
pub const DEFAULT_ASSOCIATED_DATA: &[u8] = b"associated data";

/// Result of a traced encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    pub envelope: String,
    pub trace: Vec<TraceEntry>,
}

/// Result of a traced decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub plaintext: Vec<u8>,
    pub trace: Vec<TraceEntry>,
}

impl Decrypted {
    /// The plaintext as UTF-8, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.plaintext).ok()
    }
}

/// Mode engine configured with GCM associated data and an IV source.
///
/// Holds no per-call state, so one engine can serve concurrent callers.
pub struct Engine {
    associated_data: Vec<u8>,
    nonces: Box<dyn NonceSource>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            associated_data: DEFAULT_ASSOCIATED_DATA.to_vec(),
            nonces: Box::new(OsRandom),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("associated_data_len", &self.associated_data.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the GCM associated data. Other modes ignore it.
    pub fn with_associated_data(mut self, associated_data: impl Into<Vec<u8>>) -> Self {
        self.associated_data = associated_data.into();
        self
    }

    /// Replace the IV/nonce source (tests pin it with [`crate::cipher::FixedNonce`]).
    pub fn with_nonce_source(mut self, source: impl NonceSource + 'static) -> Self {
        self.nonces = Box::new(source);
        self
    }

    pub fn associated_data(&self) -> &[u8] {
        &self.associated_data
    }

    /// Encrypt `plaintext` and return the wire envelope.
    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str, mode: Mode) -> Result<String> {
        self.seal(plaintext, passphrase, mode, &mut Discard)?.to_wire(mode)
    }

    /// Decrypt a wire envelope.
    pub fn decrypt(&self, envelope: &str, passphrase: &str, mode: Mode) -> Result<Vec<u8>> {
        self.open(envelope, passphrase, mode, &mut Discard)
    }

    /// Encrypt and return the envelope together with every intermediate state.
    pub fn encrypt_traced(&self, plaintext: &[u8], passphrase: &str, mode: Mode) -> Result<Encrypted> {
        let mut trace = Trace::new();
        let envelope = self.seal(plaintext, passphrase, mode, &mut trace)?.to_wire(mode)?;
        Ok(Encrypted {
            envelope,
            trace: trace.into_entries(),
        })
    }

    /// Decrypt and return the plaintext together with every intermediate state.
    pub fn decrypt_traced(&self, envelope: &str, passphrase: &str, mode: Mode) -> Result<Decrypted> {
        let mut trace = Trace::new();
        let plaintext = self.open(envelope, passphrase, mode, &mut trace)?;
        Ok(Decrypted {
            plaintext,
            trace: trace.into_entries(),
        })
    }

    fn fresh<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.nonces.fill(&mut bytes);
        bytes
    }

    fn seal<T: TraceSink>(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        mode: Mode,
        trace: &mut T,
    ) -> Result<Envelope> {
        let key = derive_key(passphrase)?;
        debug!(%mode, plaintext_len = plaintext.len(), "encrypting");

        let envelope = match mode {
            Mode::Ecb => {
                let cipher = Aes256Cipher::new(&key);
                Envelope {
                    iv: None,
                    auth_tag: None,
                    ciphertext: CipherModes::ecb_encrypt(&cipher, plaintext, trace),
                }
            }
            Mode::Cbc | Mode::Cfb | Mode::Ofb => {
                let cipher = Aes256Cipher::new(&key);
                let iv: Block = self.fresh();
                trace.record(Stage::InitializationVector, 0, &iv);
                let ciphertext = match mode {
                    Mode::Cbc => CipherModes::cbc_encrypt(&cipher, plaintext, &iv, trace),
                    Mode::Cfb => CipherModes::cfb_encrypt(&cipher, plaintext, &iv, trace),
                    _ => CipherModes::ofb_encrypt(&cipher, plaintext, &iv, trace),
                };
                Envelope {
                    iv: Some(iv.to_vec()),
                    auth_tag: None,
                    ciphertext,
                }
            }
            Mode::Ctr => {
                let cipher = Aes256Cipher::new(&key);
                let nonce: [u8; NONCE_SIZE] = self.fresh();
                trace.record(Stage::Nonce, 0, &nonce);
                Envelope {
                    iv: Some(nonce.to_vec()),
                    auth_tag: None,
                    ciphertext: CipherModes::ctr_encrypt(&cipher, plaintext, &nonce, trace)?,
                }
            }
            Mode::Gcm => {
                let iv: [u8; IV_SIZE] = self.fresh();
                let (ciphertext, tag) =
                    CipherModes::gcm_encrypt(&key, plaintext, &iv, &self.associated_data, trace)?;
                Envelope {
                    iv: Some(iv.to_vec()),
                    auth_tag: Some(tag.to_vec()),
                    ciphertext,
                }
            }
        };

        debug!(%mode, ciphertext_len = envelope.ciphertext.len(), "encrypted");
        Ok(envelope)
    }

    fn open<T: TraceSink>(
        &self,
        wire: &str,
        passphrase: &str,
        mode: Mode,
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        let key = derive_key(passphrase)?;
        let envelope = envelope::decode(mode, wire)?;
        debug!(%mode, ciphertext_len = envelope.ciphertext.len(), "decrypting");

        let plaintext = match mode {
            Mode::Ecb => {
                let cipher = Aes256Cipher::new(&key);
                CipherModes::ecb_decrypt(&cipher, &envelope.ciphertext, trace)?
            }
            Mode::Cbc | Mode::Cfb | Mode::Ofb => {
                let cipher = Aes256Cipher::new(&key);
                let iv: Block = fixed_field(envelope.iv.as_deref(), "IV")?;
                trace.record(Stage::InitializationVector, 0, &iv);
                match mode {
                    Mode::Cbc => CipherModes::cbc_decrypt(&cipher, &envelope.ciphertext, &iv, trace)?,
                    Mode::Cfb => CipherModes::cfb_decrypt(&cipher, &envelope.ciphertext, &iv, trace),
                    _ => CipherModes::ofb_decrypt(&cipher, &envelope.ciphertext, &iv, trace),
                }
            }
            Mode::Ctr => {
                let cipher = Aes256Cipher::new(&key);
                let nonce: [u8; NONCE_SIZE] = fixed_field(envelope.iv.as_deref(), "nonce")?;
                trace.record(Stage::Nonce, 0, &nonce);
                CipherModes::ctr_decrypt(&cipher, &envelope.ciphertext, &nonce, trace)?
            }
            Mode::Gcm => {
                let iv: [u8; IV_SIZE] = fixed_field(envelope.iv.as_deref(), "IV")?;
                let tag: [u8; TAG_SIZE] = fixed_field(envelope.auth_tag.as_deref(), "auth tag")?;
                CipherModes::gcm_decrypt(
                    &key,
                    &envelope.ciphertext,
                    &iv,
                    &tag,
                    &self.associated_data,
                    trace,
                )?
            }
        };

        debug!(%mode, plaintext_len = plaintext.len(), "decrypted");
        Ok(plaintext)
    }
}

/// Header field as a fixed-size array. `envelope::decode` has already checked
/// lengths; this only turns the check into a type.
fn fixed_field<const N: usize>(field: Option<&[u8]>, name: &str) -> Result<[u8; N]> {
    field
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| CipherModeError::MalformedEnvelope(format!("{name} must be {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::FixedNonce;

    fn pinned() -> Engine {
        Engine::new().with_nonce_source(FixedNonce(vec![0x42]))
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_roundtrip_every_mode() {
        let engine = Engine::new();
        let plaintext = b"The quick brown fox jumps over the lazy dog";
        for mode in Mode::ALL {
            let envelope = engine.encrypt(plaintext, "passphrase", mode).unwrap();
            let decrypted = engine.decrypt(&envelope, "passphrase", mode).unwrap();
            assert_eq!(decrypted, plaintext, "{mode}");
        }
    }

    #[test]
    fn test_empty_plaintext_every_mode() {
        let engine = Engine::new();
        for mode in Mode::ALL {
            let envelope = engine.encrypt(b"", "k", mode).unwrap();
            assert!(engine.decrypt(&envelope, "k", mode).unwrap().is_empty(), "{mode}");
        }
    }

    #[test]
    fn test_envelope_shapes() {
        let engine = pinned();
        let iv16 = "42".repeat(16);
        let iv12 = "42".repeat(12);

        let cbc = engine.encrypt(b"HELLO WORLD", "mykey123", Mode::Cbc).unwrap();
        assert!(cbc.starts_with(&format!("{iv16}:")));
        assert_eq!(cbc.len(), 32 + 1 + 32);

        let ctr = engine.encrypt(b"HELLO WORLD", "mykey123", Mode::Ctr).unwrap();
        assert!(ctr.starts_with(&format!("{iv12}:")));
        assert_eq!(ctr.len(), 24 + 1 + 22);

        let gcm = engine.encrypt(b"test", "k", Mode::Gcm).unwrap();
        let fields: Vec<&str> = gcm.split(':').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0], iv12);
        assert_eq!(fields[1].len(), 32);
        assert_eq!(fields[2].len(), 8);

        let ecb = engine.encrypt(&[0u8; 16], "k", Mode::Ecb).unwrap();
        assert!(!ecb.contains(':'));
        assert_eq!(ecb.len(), 64);
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let engine = Engine::new();
        assert!(matches!(
            engine.encrypt(b"x", "", Mode::Cbc),
            Err(CipherModeError::InvalidKey(_))
        ));
        assert!(matches!(
            engine.decrypt("00", "", Mode::Ecb),
            Err(CipherModeError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_wrong_key_gcm_fails_closed() {
        let engine = Engine::new();
        let envelope = engine.encrypt(b"secret", "right", Mode::Gcm).unwrap();
        assert_eq!(
            engine.decrypt(&envelope, "wrong", Mode::Gcm),
            Err(CipherModeError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_associated_data_must_match() {
        let sealer = Engine::new().with_associated_data("session-1");
        let envelope = sealer.encrypt(b"payload", "k", Mode::Gcm).unwrap();

        assert_eq!(sealer.decrypt(&envelope, "k", Mode::Gcm).unwrap(), b"payload");
        assert_eq!(
            Engine::new().decrypt(&envelope, "k", Mode::Gcm),
            Err(CipherModeError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_traced_and_untraced_agree() {
        let engine = pinned();
        for mode in Mode::ALL {
            let plain = engine.encrypt(b"same path both ways", "k", mode).unwrap();
            let traced = engine.encrypt_traced(b"same path both ways", "k", mode).unwrap();
            assert_eq!(plain, traced.envelope, "{mode}");
            assert!(!traced.trace.is_empty());
        }
    }

    #[test]
    fn test_trace_headers_use_block_zero() {
        let engine = Engine::new();

        let cbc = engine.encrypt_traced(b"HELLO", "k", Mode::Cbc).unwrap();
        assert_eq!(cbc.trace[0].stage, Stage::InitializationVector);
        assert_eq!(cbc.trace[0].block_index, 0);
        assert_eq!(cbc.trace[1].block_index, 1);

        let ctr = engine.encrypt_traced(b"HELLO", "k", Mode::Ctr).unwrap();
        assert_eq!(ctr.trace[0].stage, Stage::Nonce);
        assert_eq!(ctr.trace[0].hex_data.len(), 24);

        let ecb = engine.encrypt_traced(b"HELLO", "k", Mode::Ecb).unwrap();
        assert!(ecb.trace.iter().all(|e| e.block_index >= 1));
    }

    #[test]
    fn test_decrypt_traced_text() {
        let engine = Engine::new();
        let envelope = engine.encrypt(b"HELLO WORLD", "mykey123", Mode::Ofb).unwrap();
        let decrypted = engine.decrypt_traced(&envelope, "mykey123", Mode::Ofb).unwrap();

        assert_eq!(decrypted.text(), Some("HELLO WORLD"));
        let last = decrypted.trace.last().unwrap();
        assert_eq!(last.stage, Stage::PlaintextBlock);
        assert_eq!(last.text_data.as_deref(), Some("HELLO WORLD"));
    }

    #[test]
    fn test_decrypt_rejects_mismatched_mode() {
        let engine = Engine::new();
        let envelope = engine.encrypt(b"data", "k", Mode::Gcm).unwrap();
        assert!(matches!(
            engine.decrypt(&envelope, "k", Mode::Cbc),
            Err(CipherModeError::MalformedEnvelope(_))
        ));
    }
}
