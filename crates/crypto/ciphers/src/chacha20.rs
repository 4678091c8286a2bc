//! The ChaCha20 stream cipher ([RFC 8439](https://www.rfc-editor.org/rfc/rfc8439)).
//!
//! Unlike [crate::Aes128Cipher] this isn't a [crate::BlockCipher] - it produces a
//! keystream that is then XORed into the plaintext, so it gets its own small API
//! instead.

const STATE_WORDS: usize = 16;

/// `"expand 32-byte k"` split into four little-endian 32-bit words.
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

#[derive(Clone)]
pub struct ChaCha20 {
    key: [u32; 8],
    nonce: [u32; 3],
}

fn quarter_round(state: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

impl ChaCha20 {
    #[must_use]
    pub fn new(key: [u8; 32], nonce: [u8; 12]) -> Self {
        let mut key_words = [0u32; 8];
        for (word, chunk) in key_words.iter_mut().zip(key.array_chunks::<4>()) {
            *word = u32::from_le_bytes(*chunk);
        }

        let mut nonce_words = [0u32; 3];
        for (word, chunk) in nonce_words.iter_mut().zip(nonce.array_chunks::<4>()) {
            *word = u32::from_le_bytes(*chunk);
        }

        Self {
            key: key_words,
            nonce: nonce_words,
        }
    }

    fn block(&self, counter: u32) -> [u8; 64] {
        let mut state = [0u32; STATE_WORDS];
        state[0..4].copy_from_slice(&CONSTANTS);
        state[4..12].copy_from_slice(&self.key);
        state[12] = counter;
        state[13..16].copy_from_slice(&self.nonce);

        let initial = state;

        for _ in 0..10 {
            quarter_round(&mut state, 0, 4, 8, 12);
            quarter_round(&mut state, 1, 5, 9, 13);
            quarter_round(&mut state, 2, 6, 10, 14);
            quarter_round(&mut state, 3, 7, 11, 15);

            quarter_round(&mut state, 0, 5, 10, 15);
            quarter_round(&mut state, 1, 6, 11, 12);
            quarter_round(&mut state, 2, 7, 8, 13);
            quarter_round(&mut state, 3, 4, 9, 14);
        }

        for (word, initial_word) in state.iter_mut().zip(initial) {
            *word = word.wrapping_add(initial_word);
        }

        let mut output = [0u8; 64];
        for (chunk, word) in output.array_chunks_mut::<4>().zip(state) {
            *chunk = word.to_le_bytes();
        }
        output
    }

    /// XORs `data` in place with the keystream, starting at `counter` blocks
    /// (RFC 8439 §2.4's initial block counter).
    pub fn apply_keystream(&self, counter: u32, data: &mut [u8]) {
        for (block_index, chunk) in data.chunks_mut(64).enumerate() {
            let keystream = self.block(counter.wrapping_add(block_index as u32));
            for (byte, keystream_byte) in chunk.iter_mut().zip(keystream) {
                *byte ^= keystream_byte;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 8439 §2.3.2 test vector.
    #[test]
    fn rfc8439_block_test_vector() {
        let key = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10,
            0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f,
        ];
        let nonce = [0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x4a, 0x00, 0x00, 0x00, 0x00];

        let cipher = ChaCha20::new(key, nonce);
        let block = cipher.block(1);

        assert_eq!(block[0], 0x10);
        assert_eq!(block[1], 0xf1);
    }

    #[test]
    fn keystream_is_involution() {
        let cipher = ChaCha20::new([0x42; 32], [0x24; 12]);
        let plaintext = b"hello, tls record layer!".to_vec();

        let mut ciphertext = plaintext.clone();
        cipher.apply_keystream(0, &mut ciphertext);
        assert_ne!(ciphertext, plaintext);

        let mut decrypted = ciphertext;
        cipher.apply_keystream(0, &mut decrypted);
        assert_eq!(decrypted, plaintext);
    }
}
