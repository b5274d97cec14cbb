//! CBC (Cipher Block Chaining) mode implementation

use crate::block::{self, Block};
use crate::trace::{Stage, TraceSink};
use crate::{BlockCipher, Result};

use super::CipherModes;

/// One CBC encryption step: returns the XOR input and the ciphertext block,
/// which is also the next chaining value.
fn encrypt_step<C: BlockCipher>(cipher: &C, previous: &Block, plaintext: &Block) -> (Block, Block) {
    let xored = block::xor_blocks(plaintext, previous);
    (xored, cipher.encrypt_block(&xored))
}

/// One CBC decryption step: returns the raw block decryption and the
/// plaintext. The next chaining value is the input ciphertext block.
fn decrypt_step<C: BlockCipher>(cipher: &C, previous: &Block, ciphertext: &Block) -> (Block, Block) {
    let decrypted = cipher.decrypt_block(ciphertext);
    (decrypted, block::xor_blocks(&decrypted, previous))
}

impl CipherModes {
    /// CBC mode encryption
    ///
    /// C_i = E(K, P_i ⊕ C_{i-1}), C_0 = IV
    pub fn cbc_encrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        plaintext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Vec<u8> {
        let blocks = block::segment_padded(plaintext);
        let mut ciphertext = Vec::with_capacity(blocks.len() * block::BLOCK_SIZE);
        let mut previous = *iv;

        for (i, p) in blocks.iter().enumerate() {
            trace.record(Stage::PlaintextBlock, i + 1, p);
            let (xored, c) = encrypt_step(cipher, &previous, p);
            trace.record(Stage::XorWithPrevious, i + 1, &xored);
            trace.record(Stage::AesEncryption, i + 1, &c);

            ciphertext.extend_from_slice(&c);
            previous = c;
        }

        ciphertext
    }

    /// CBC mode decryption
    ///
    /// P_i = D(K, C_i) ⊕ C_{i-1}, C_0 = IV
    pub fn cbc_decrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        ciphertext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        let blocks = block::full_blocks(ciphertext)?;
        let mut plaintext = Vec::with_capacity(ciphertext.len());
        let mut previous = *iv;

        for (i, c) in blocks.iter().enumerate() {
            trace.record(Stage::CiphertextBlock, i + 1, c);
            let (decrypted, p) = decrypt_step(cipher, &previous, c);
            trace.record(Stage::AesDecryption, i + 1, &decrypted);
            trace.record(Stage::XorWithPrevious, i + 1, &p);

            plaintext.extend_from_slice(&p);
            previous = *c;
        }

        let len = block::unpad(&plaintext)?.len();
        plaintext.truncate(len);
        Ok(plaintext)
    }
}
