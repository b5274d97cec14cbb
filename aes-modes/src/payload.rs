//! Image payload helpers
//!
//! Images travel through the engine as base64 text, the same way the upload
//! path has always fed them in. After decryption the magic bytes tell which
//! content type to hand back. Purely cosmetic: nothing here touches the
//! cryptography.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{CipherModeError, Result};

/// Encode raw image bytes as the base64 text that gets encrypted.
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode decrypted base64 text back into image bytes.
pub fn decode_image(text: &[u8]) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim_ascii())
        .map_err(|e| CipherModeError::InvalidPayload(format!("image payload is not base64: {e}")))
}

/// Image formats recognized by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }
}
