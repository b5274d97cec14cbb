//! Block segmentation, PKCS#7 padding and XOR helpers

use crate::error::{CipherModeError, Result};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// One AES block
pub type Block = [u8; BLOCK_SIZE];

/// Split a payload into 16-byte chunks. The last chunk may be short.
pub fn segment(payload: &[u8]) -> std::slice::Chunks<'_, u8> {
    payload.chunks(BLOCK_SIZE)
}

/// Split a payload into full blocks, PKCS#7-padding the tail.
///
/// Padding is always added: an aligned payload (including the empty one)
/// gets a whole block of `0x10` bytes.
pub fn segment_padded(payload: &[u8]) -> Vec<Block> {
    let pad = BLOCK_SIZE - payload.len() % BLOCK_SIZE;
    let mut blocks = Vec::with_capacity(payload.len() / BLOCK_SIZE + 1);

    let mut chunks = payload.chunks_exact(BLOCK_SIZE);
    for chunk in chunks.by_ref() {
        blocks.push(to_block(chunk));
    }

    let tail = chunks.remainder();
    let mut last = [pad as u8; BLOCK_SIZE];
    last[..tail.len()].copy_from_slice(tail);
    blocks.push(last);

    blocks
}

/// Strip PKCS#7 padding, checking every pad byte.
pub fn unpad(data: &[u8]) -> Result<&[u8]> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(CipherModeError::InvalidPadding);
    }

    let pad = data[data.len() - 1] as usize;
    if pad == 0 || pad > BLOCK_SIZE {
        return Err(CipherModeError::InvalidPadding);
    }

    let (body, tail) = data.split_at(data.len() - pad);
    if tail.iter().any(|&b| b as usize != pad) {
        return Err(CipherModeError::InvalidPadding);
    }

    Ok(body)
}

/// Split ciphertext of a padded mode into blocks, rejecting ragged input.
pub fn full_blocks(ciphertext: &[u8]) -> Result<Vec<Block>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherModeError::MalformedEnvelope(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }

    Ok(ciphertext.chunks_exact(BLOCK_SIZE).map(to_block).collect())
}

/// Copy a slice of exactly `BLOCK_SIZE` bytes into a block.
pub(crate) fn to_block(chunk: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(chunk);
    block
}

/// XOR two full blocks
pub fn xor_blocks(a: &Block, b: &Block) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

/// XOR `data` with the leading bytes of a keystream block.
///
/// Stream-like modes use this for the final short block.
pub fn xor_prefix(data: &[u8], keystream: &Block) -> Vec<u8> {
    data.iter().zip(keystream.iter()).map(|(d, k)| d ^ k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_keeps_short_tail() {
        let data = [7u8; 37];
        let sizes: Vec<usize> = segment(&data).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![16, 16, 5]);
        assert_eq!(segment(&[]).count(), 0);
    }

    #[test]
    fn test_padding_partial_block() {
        let blocks = segment_padded(b"HELLO WORLD");
        assert_eq!(blocks.len(), 1);
        assert_eq!(&blocks[0][..11], b"HELLO WORLD");
        assert_eq!(&blocks[0][11..], &[5u8; 5]);
    }

    #[test]
    fn test_padding_aligned_adds_full_block() {
        let blocks = segment_padded(&[0u8; 16]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], [16u8; 16]);

        let empty = segment_padded(&[]);
        assert_eq!(empty, vec![[16u8; 16]]);
    }

    #[test]
    fn test_unpad_roundtrip() {
        let message = b"Integration test message for all modes!";
        let flat: Vec<u8> = segment_padded(message).concat();
        assert_eq!(unpad(&flat).unwrap(), &message[..]);
    }

    #[test]
    fn test_unpad_rejects_bad_padding() {
        let mut block = [4u8; 16];
        block[13] = 9;
        assert_eq!(unpad(&block), Err(CipherModeError::InvalidPadding));

        assert_eq!(unpad(&[0u8; 16]), Err(CipherModeError::InvalidPadding));
        assert_eq!(unpad(&[17u8; 16]), Err(CipherModeError::InvalidPadding));
        assert_eq!(unpad(&[1u8; 15]), Err(CipherModeError::InvalidPadding));
        assert_eq!(unpad(&[]), Err(CipherModeError::InvalidPadding));
    }

    #[test]
    fn test_full_blocks_rejects_ragged_input() {
        assert!(matches!(
            full_blocks(&[0u8; 17]),
            Err(CipherModeError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            full_blocks(&[]),
            Err(CipherModeError::MalformedEnvelope(_))
        ));
        assert_eq!(full_blocks(&[1u8; 32]).unwrap().len(), 2);
    }

    #[test]
    fn test_xor_helpers() {
        let a = [0xAAu8; 16];
        let b = [0xFFu8; 16];
        assert_eq!(xor_blocks(&a, &b), [0x55u8; 16]);
        assert_eq!(xor_prefix(&[0x0F, 0xF0], &b), vec![0xF0, 0x0F]);
    }
}
