//! CFB (Cipher Feedback) mode implementation, full-block (CFB-128)

use crate::block::{self, Block};
use crate::trace::{Stage, TraceSink};
use crate::BlockCipher;

use super::CipherModes;

/// Next feedback register: the full ciphertext block just produced.
///
/// Only the final block of a message can be short, and it is never fed back.
fn next_register(ciphertext: &[u8], keystream: &Block) -> Block {
    let mut register = *keystream;
    register[..ciphertext.len()].copy_from_slice(ciphertext);
    register
}

impl CipherModes {
    /// CFB mode encryption
    ///
    /// Algorithm:
    /// 1. R_1 = IV
    /// 2. C_i = P_i ⊕ E(K, R_i)
    /// 3. R_{i+1} = C_i
    pub fn cfb_encrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        plaintext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Vec<u8> {
        let mut ciphertext = Vec::with_capacity(plaintext.len());
        let mut register = *iv;

        for (i, chunk) in block::segment(plaintext).enumerate() {
            trace.record(Stage::PlaintextBlock, i + 1, chunk);

            let keystream = cipher.encrypt_block(&register);
            trace.record(Stage::KeystreamBlock, i + 1, &keystream);

            let c = block::xor_prefix(chunk, &keystream);
            trace.record(Stage::CiphertextBlock, i + 1, &c);

            register = next_register(&c, &keystream);
            ciphertext.extend_from_slice(&c);
        }

        ciphertext
    }

    /// CFB mode decryption
    ///
    /// The keystream for block i depends on ciphertext block i-1, so
    /// decryption runs the cipher forward, never backward.
    pub fn cfb_decrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        ciphertext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Vec<u8> {
        let mut plaintext = Vec::with_capacity(ciphertext.len());
        let mut register = *iv;

        for (i, chunk) in block::segment(ciphertext).enumerate() {
            trace.record(Stage::CiphertextBlock, i + 1, chunk);

            let keystream = cipher.encrypt_block(&register);
            trace.record(Stage::KeystreamBlock, i + 1, &keystream);

            let p = block::xor_prefix(chunk, &keystream);
            trace.record(Stage::PlaintextBlock, i + 1, &p);

            register = next_register(chunk, &keystream);
            plaintext.extend_from_slice(&p);
        }

        plaintext
    }
}
