//! CTR (Counter) mode implementation

use crate::block::{self, Block, BLOCK_SIZE};
use crate::error::CipherModeError;
use crate::trace::{Stage, TraceSink};
use crate::{BlockCipher, Result};

use super::CipherModes;

/// Size of the per-message nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Value of the counter for the first block
pub const INITIAL_COUNTER: u32 = 1;

/// Build a counter block: nonce || counter (big-endian)
pub fn counter_block(nonce: &[u8; NONCE_SIZE], counter: u32) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block[..NONCE_SIZE].copy_from_slice(nonce);
    block[NONCE_SIZE..].copy_from_slice(&counter.to_be_bytes());
    block
}

/// Refuse messages that would need more counter values than a `u32` holds
/// after starting at [`INITIAL_COUNTER`]. The counter never wraps.
fn check_counter_span(len: usize) -> Result<()> {
    let blocks_needed = len.div_ceil(BLOCK_SIZE);
    if blocks_needed as u64 > u64::from(u32::MAX - INITIAL_COUNTER + 1) {
        return Err(CipherModeError::CryptoPrimitive(format!(
            "message of {blocks_needed} blocks exhausts the 32-bit CTR counter"
        )));
    }
    Ok(())
}

impl CipherModes {
    /// CTR mode encryption
    ///
    /// In CTR mode, a counter is used which is incremented for each block.
    /// The encryption of the counter block is XORed with the plaintext.
    ///
    /// Algorithm:
    /// 1. T_i = Nonce || (i as u32, big-endian) for i = 1, ..., n
    /// 2. C_i = P_i ⊕ E(K, T_i)
    ///
    /// The counter never wraps: a message needing more than 2^32 - 1 blocks
    /// is refused.
    pub fn ctr_encrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        plaintext: &[u8],
        nonce: &[u8; NONCE_SIZE],
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        Self::ctr_apply(cipher, plaintext, nonce, Direction::Encrypt, trace)
    }

    /// CTR mode decryption
    ///
    /// Since CTR is a stream cipher mode, decryption is identical to
    /// encryption; only the recorded stage names differ.
    pub fn ctr_decrypt<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        ciphertext: &[u8],
        nonce: &[u8; NONCE_SIZE],
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        Self::ctr_apply(cipher, ciphertext, nonce, Direction::Decrypt, trace)
    }

    fn ctr_apply<C: BlockCipher, T: TraceSink>(
        cipher: &C,
        input: &[u8],
        nonce: &[u8; NONCE_SIZE],
        direction: Direction,
        trace: &mut T,
    ) -> Result<Vec<u8>> {
        check_counter_span(input.len())?;

        let (input_stage, output_stage) = match direction {
            Direction::Encrypt => (Stage::PlaintextBlock, Stage::XorResult),
            Direction::Decrypt => (Stage::CiphertextBlock, Stage::PlaintextBlock),
        };

        let mut output = Vec::with_capacity(input.len());
        let mut counter = INITIAL_COUNTER;

        for (i, chunk) in block::segment(input).enumerate() {
            trace.record(input_stage, i + 1, chunk);

            let counter_block = counter_block(nonce, counter);
            trace.record(Stage::CounterBlock, i + 1, &counter_block);

            let keystream = cipher.encrypt_block(&counter_block);
            trace.record(Stage::Keystream, i + 1, &keystream);

            // XOR only as many keystream bytes as the chunk needs
            let xored = block::xor_prefix(chunk, &keystream);
            trace.record(output_stage, i + 1, &xored);
            output.extend_from_slice(&xored);

            counter = counter.wrapping_add(1);
        }

        Ok(output)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}
