//! Error types for cipher mode operations

use thiserror::Error;

/// Every failure the engine can report.
///
/// Messages describe structure only ("expected IV:CIPHERTEXT, got 3 fields");
/// key material and plaintext never end up in them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherModeError {
    #[error("Invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("Unsupported mode {0:?} (supported: ECB, CBC, CTR, CFB, OFB, GCM)")]
    UnsupportedMode(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Authentication failed: the data may have been tampered with or the key is incorrect")]
    AuthenticationFailed,

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Crypto primitive error: {0}")]
    CryptoPrimitive(String),
}

pub type Result<T> = std::result::Result<T, CipherModeError>;
