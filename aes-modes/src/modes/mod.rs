//! Cipher modes implementation

pub mod cbc;
pub mod cfb;
pub mod ctr;
pub mod ecb;
pub mod gcm;
pub mod ofb;

use std::fmt;
use std::str::FromStr;

use crate::error::CipherModeError;

/// Main struct for cipher modes
///
/// Each mode lives in its own file as a pair of `impl CipherModes` functions,
/// generic over the block cipher and the trace sink.
pub struct CipherModes;

/// Supported modes of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ecb,
    Cbc,
    Ctr,
    Cfb,
    Ofb,
    Gcm,
}

impl Mode {
    pub const ALL: [Mode; 6] = [Mode::Ecb, Mode::Cbc, Mode::Ctr, Mode::Cfb, Mode::Ofb, Mode::Gcm];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Ecb => "ECB",
            Mode::Cbc => "CBC",
            Mode::Ctr => "CTR",
            Mode::Cfb => "CFB",
            Mode::Ofb => "OFB",
            Mode::Gcm => "GCM",
        }
    }

    /// Length of the IV or nonce carried in the envelope
    pub fn iv_len(self) -> usize {
        match self {
            Mode::Ecb => 0,
            Mode::Cbc | Mode::Cfb | Mode::Ofb => 16,
            Mode::Ctr => ctr::NONCE_SIZE,
            Mode::Gcm => gcm::IV_SIZE,
        }
    }

    /// Number of colon-separated envelope fields
    pub fn field_count(self) -> usize {
        match self {
            Mode::Ecb => 1,
            Mode::Gcm => 3,
            _ => 2,
        }
    }

    /// Human-readable envelope layout, used in error messages
    pub fn layout(self) -> &'static str {
        match self {
            Mode::Ecb => "CIPHERTEXT",
            Mode::Ctr => "NONCE:CIPHERTEXT",
            Mode::Gcm => "IV:AUTHTAG:CIPHERTEXT",
            _ => "IV:CIPHERTEXT",
        }
    }

    /// Whether the mode PKCS#7-pads the plaintext
    pub fn is_padded(self) -> bool {
        matches!(self, Mode::Ecb | Mode::Cbc)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CipherModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CipherModeError::UnsupportedMode(s.to_string()))
    }
}
