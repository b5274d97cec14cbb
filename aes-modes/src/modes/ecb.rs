//! ECB (Electronic Code Book) mode implementation
//!
//! Every block is encrypted on its own, so equal plaintext blocks give equal
//! ciphertext blocks. Kept for demonstration of exactly that weakness.

use crate::block::{self, Block};
use crate::trace::{Stage, TraceSink};
use crate::{BlockCipher, Result};

use super::CipherModes;

impl CipherModes {
    /// ECB mode encryption
    pub fn ecb_encrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        plaintext: &[u8],
        trace: &mut T,
    ) -> Vec<u8> {
        let blocks: Vec<Block> = block::segment_padded(plaintext);
        let mut ciphertext = Vec::with_capacity(blocks.len() * block::BLOCK_SIZE);

        for (i, p) in blocks.iter().enumerate() {
            trace.record(Stage::PlaintextBlock, i + 1, p);
            let c = cipher.encrypt_block(p);
            trace.record(Stage::AesEncryption, i + 1, &c);
            ciphertext.extend_from_slice(&c);
        }

        ciphertext
    }

    /// ECB mode decryption
    pub fn ecb_decrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        ciphertext: &[u8],
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        let blocks = block::full_blocks(ciphertext)?;
        let mut plaintext = Vec::with_capacity(ciphertext.len());

        for (i, c) in blocks.iter().enumerate() {
            trace.record(Stage::CiphertextBlock, i + 1, c);
            let p = cipher.decrypt_block(c);
            trace.record(Stage::AesDecryption, i + 1, &p);
            plaintext.extend_from_slice(&p);
        }

        let len = block::unpad(&plaintext)?.len();
        plaintext.truncate(len);
        Ok(plaintext)
    }
}
