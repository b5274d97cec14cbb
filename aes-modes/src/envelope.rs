//! Wire codec: colon-delimited hex envelopes
//!
//! ```text
//! ECB           CIPHERTEXT
//! CBC, CFB, OFB IV:CIPHERTEXT
//! CTR           NONCE:CIPHERTEXT
//! GCM           IV:AUTHTAG:CIPHERTEXT
//! ```
//!
//! Decoding checks the exact field count and every length for the mode; it
//! never guesses at a best-effort parse.

use crate::error::{CipherModeError, Result};
use crate::modes::gcm::TAG_SIZE;
use crate::modes::Mode;

/// Separator between envelope fields
pub const SEPARATOR: &str = ":";

/// Decoded envelope fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// IV or nonce; absent for ECB
    pub iv: Option<Vec<u8>>,
    /// Authentication tag; GCM only
    pub auth_tag: Option<Vec<u8>>,
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Serialize for the given mode.
    pub fn to_wire(&self, mode: Mode) -> Result<String> {
        encode(mode, self.iv.as_deref(), self.auth_tag.as_deref(), &self.ciphertext)
    }

    /// Parse the wire form for the given mode.
    pub fn from_wire(mode: Mode, envelope: &str) -> Result<Self> {
        decode(mode, envelope)
    }
}

fn malformed(message: String) -> CipherModeError {
    CipherModeError::MalformedEnvelope(message)
}

fn check_iv(mode: Mode, iv: Option<&[u8]>) -> Result<()> {
    match (mode.iv_len(), iv) {
        (0, None) => Ok(()),
        (0, Some(_)) => Err(malformed(format!("{mode} takes no IV"))),
        (_, None) => Err(malformed(format!("{mode} requires an IV"))),
        (expected, Some(iv)) if iv.len() != expected => Err(malformed(format!(
            "{mode} IV must be {expected} bytes, got {}",
            iv.len()
        ))),
        _ => Ok(()),
    }
}

fn check_tag(mode: Mode, auth_tag: Option<&[u8]>) -> Result<()> {
    match (mode, auth_tag) {
        (Mode::Gcm, Some(tag)) if tag.len() != TAG_SIZE => Err(malformed(format!(
            "GCM auth tag must be {TAG_SIZE} bytes, got {}",
            tag.len()
        ))),
        (Mode::Gcm, Some(_)) => Ok(()),
        (Mode::Gcm, None) => Err(malformed("GCM requires an auth tag".to_string())),
        (_, Some(_)) => Err(malformed(format!("{mode} takes no auth tag"))),
        (_, None) => Ok(()),
    }
}

/// Build the wire string for `mode`.
pub fn encode(
    mode: Mode,
    iv: Option<&[u8]>,
    auth_tag: Option<&[u8]>,
    ciphertext: &[u8],
) -> Result<String> {
    check_iv(mode, iv)?;
    check_tag(mode, auth_tag)?;

    let fields: Vec<String> = iv
        .into_iter()
        .chain(auth_tag)
        .chain(std::iter::once(ciphertext))
        .map(hex::encode)
        .collect();

    Ok(fields.join(SEPARATOR))
}

/// Split and validate a wire string for `mode`.
pub fn decode(mode: Mode, envelope: &str) -> Result<Envelope> {
    let fields: Vec<&str> = envelope.trim().split(SEPARATOR).collect();
    if fields.len() != mode.field_count() {
        return Err(malformed(format!(
            "expected {} for {mode}, got {} fields",
            mode.layout(),
            fields.len()
        )));
    }

    let names = mode.layout().split(SEPARATOR);
    let mut decoded = Vec::with_capacity(fields.len());
    for (field, name) in fields.iter().zip(names) {
        let bytes = hex::decode(field)
            .map_err(|e| malformed(format!("{name} field is not valid hex: {e}")))?;
        decoded.push(bytes);
    }

    let ciphertext = decoded.pop().unwrap_or_default();
    let (iv, auth_tag) = match mode {
        Mode::Ecb => (None, None),
        Mode::Gcm => {
            let tag = decoded.pop();
            (decoded.pop(), tag)
        }
        _ => (decoded.pop(), None),
    };

    check_iv(mode, iv.as_deref())?;
    check_tag(mode, auth_tag.as_deref())?;

    Ok(Envelope {
        iv,
        auth_tag,
        ciphertext,
    })
}

/// Flip the last hex digit of the ciphertext field, keeping every other field.
///
/// A `'0'` becomes `'1'`, anything else becomes `'0'`, so the digit always
/// changes. Used to demonstrate that GCM refuses modified data.
pub fn tamper(envelope: &str) -> Result<String> {
    let trimmed = envelope.trim();
    let (head, ciphertext) = match trimmed.rfind(SEPARATOR) {
        Some(at) => trimmed.split_at(at + SEPARATOR.len()),
        None => ("", trimmed),
    };

    let mut digits = ciphertext.to_string();
    let last = digits
        .pop()
        .ok_or_else(|| malformed("ciphertext field is empty, nothing to tamper with".to_string()))?;
    digits.push(if last == '0' { '1' } else { '0' });

    Ok(format!("{head}{digits}"))
}
