//! OFB (Output Feedback) mode implementation

use crate::block::{self, Block};
use crate::trace::{Stage, TraceSink};
use crate::BlockCipher;

use super::CipherModes;

impl CipherModes {
    /// OFB mode encryption
    ///
    /// In OFB mode, the block cipher is used to generate a pseudorandom keystream
    /// which is then XORed with the plaintext.
    ///
    /// Algorithm:
    /// 1. O_0 = IV
    /// 2. O_i = E(K, O_{i-1}) for i = 1, 2, ..., n
    /// 3. C_i = P_i ⊕ O_i
    pub fn ofb_encrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        plaintext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Vec<u8> {
        Self::ofb_apply(cipher, plaintext, iv, (Stage::PlaintextBlock, Stage::CiphertextBlock), trace)
    }

    /// OFB mode decryption
    ///
    /// Since OFB is a stream cipher mode, decryption is identical to encryption.
    pub fn ofb_decrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        ciphertext: &[u8],
        iv: &Block,
        trace: &mut T,
    ) -> Vec<u8> {
        Self::ofb_apply(cipher, ciphertext, iv, (Stage::CiphertextBlock, Stage::PlaintextBlock), trace)
    }

    fn ofb_apply<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        input: &[u8],
        iv: &Block,
        (input_stage, output_stage): (Stage, Stage),
        trace: &mut T,
    ) -> Vec<u8> {
        let mut output = Vec::with_capacity(input.len());
        let mut feedback = *iv;

        for (i, chunk) in block::segment(input).enumerate() {
            trace.record(input_stage, i + 1, chunk);

            // The keystream depends only on the IV, never on the data
            feedback = cipher.encrypt_block(&feedback);
            trace.record(Stage::KeystreamBlock, i + 1, &feedback);

            let xored = block::xor_prefix(chunk, &feedback);
            trace.record(output_stage, i + 1, &xored);
            output.extend_from_slice(&xored);
        }

        output
    }
}
