//! Intermediate-state recording for visualization
//!
//! The modes report every state they pass through (plaintext block, XOR
//! result, keystream, ciphertext block, ...) to a [`TraceSink`]. Production
//! callers hand in [`Discard`], which compiles the recording away; the
//! visualizer hands in [`Trace`] and gets an ordered list of [`TraceEntry`].
//! Recording never influences the cryptographic result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Printable ASCII characters required before `text_data` is shown, in percent
const PRINTABLE_PERCENT: usize = 70;

/// Name of a recorded state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Initialization Vector")]
    InitializationVector,
    #[serde(rename = "Nonce")]
    Nonce,
    #[serde(rename = "Associated Data")]
    AssociatedData,
    #[serde(rename = "Authentication Tag")]
    AuthenticationTag,
    #[serde(rename = "Plaintext Block")]
    PlaintextBlock,
    #[serde(rename = "Ciphertext Block")]
    CiphertextBlock,
    #[serde(rename = "XOR with Previous")]
    XorWithPrevious,
    #[serde(rename = "AES Encryption")]
    AesEncryption,
    #[serde(rename = "AES Decryption")]
    AesDecryption,
    #[serde(rename = "Counter Block")]
    CounterBlock,
    #[serde(rename = "Keystream")]
    Keystream,
    #[serde(rename = "Keystream Block")]
    KeystreamBlock,
    #[serde(rename = "XOR Result")]
    XorResult,
}

impl Stage {
    pub const ALL: [Stage; 13] = [
        Stage::InitializationVector,
        Stage::Nonce,
        Stage::AssociatedData,
        Stage::AuthenticationTag,
        Stage::PlaintextBlock,
        Stage::CiphertextBlock,
        Stage::XorWithPrevious,
        Stage::AesEncryption,
        Stage::AesDecryption,
        Stage::CounterBlock,
        Stage::Keystream,
        Stage::KeystreamBlock,
        Stage::XorResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::InitializationVector => "Initialization Vector",
            Stage::Nonce => "Nonce",
            Stage::AssociatedData => "Associated Data",
            Stage::AuthenticationTag => "Authentication Tag",
            Stage::PlaintextBlock => "Plaintext Block",
            Stage::CiphertextBlock => "Ciphertext Block",
            Stage::XorWithPrevious => "XOR with Previous",
            Stage::AesEncryption => "AES Encryption",
            Stage::AesDecryption => "AES Decryption",
            Stage::CounterBlock => "Counter Block",
            Stage::Keystream => "Keystream",
            Stage::KeystreamBlock => "Keystream Block",
            Stage::XorResult => "XOR Result",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded state.
///
/// `block_index` is 0 for header material (IV, nonce, tag, associated data)
/// and the 1-based block number otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub stage: Stage,
    pub block_index: usize,
    pub hex_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_data: Option<String>,
}

/// Build a trace entry. Never fails: undecodable bytes just get no text.
pub fn record(stage: Stage, block_index: usize, bytes: &[u8]) -> TraceEntry {
    TraceEntry {
        stage,
        block_index,
        hex_data: hex::encode(bytes),
        text_data: printable_text(bytes),
    }
}

/// Best-effort UTF-8 rendering, only when it is mostly printable ASCII.
fn printable_text(bytes: &[u8]) -> Option<String> {
    let decoded = std::str::from_utf8(bytes).ok()?;

    let total = decoded.chars().count();
    if total == 0 {
        return None;
    }

    let printable = decoded.chars().filter(|c| (' '..='~').contains(c)).count();
    if printable * 100 < total * PRINTABLE_PERCENT {
        return None;
    }

    Some(decoded.trim_end_matches('\0').to_string())
}

/// Receiver for intermediate states
pub trait TraceSink {
    fn record(&mut self, stage: Stage, block_index: usize, bytes: &[u8]);
}

/// Drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl TraceSink for Discard {
    #[inline(always)]
    fn record(&mut self, _stage: Stage, _block_index: usize, _bytes: &[u8]) {}
}

/// Collects entries in order
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

impl TraceSink for Trace {
    fn record(&mut self, stage: Stage, block_index: usize, bytes: &[u8]) {
        self.entries.push(record(stage, block_index, bytes));
    }
}

/// Group entries by block index, header material under 0.
pub fn group_by_block(entries: &[TraceEntry]) -> BTreeMap<usize, Vec<&TraceEntry>> {
    let mut groups: BTreeMap<usize, Vec<&TraceEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.block_index).or_default().push(entry);
    }
    groups
}
