//! Block operations for Argon2.
//!
//! This module defines the fundamental 1024-byte block structure and the
//! compression function G that forms the core of the Argon2 algorithm.
//! The compression function is based on the BLAKE2b round function but
//! uses additional multiplication operations for enhanced diffusion.

use zeroize::Zeroize;

/// Number of 64-bit words in a block.
pub(crate) const QWORDS_IN_BLOCK: usize = 128;

/// Size of a block in bytes.
pub const BLOCK_SIZE: usize = QWORDS_IN_BLOCK * 8;

/// A 1024-byte memory block (128 × 64-bit words).
///
/// Blocks are the fundamental unit of memory in Argon2. The algorithm
/// operates by filling and mixing these blocks using the compression
/// function G. Each block is zeroed on drop for security.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(align(64))]
pub struct Block(pub [u64; QWORDS_IN_BLOCK]);

impl Block {
    pub(crate) const ZERO: Self = Self([0u64; QWORDS_IN_BLOCK]);

    pub(crate) fn in_place_xor(&mut self, other: &Block) {
        self.0
            .iter_mut()
            .zip(other.0.iter())
            .for_each(|(a, b)| *a ^= b);
    }

    pub(crate) fn from_bytes(bytes: &[u8; BLOCK_SIZE]) -> Self {
        let mut block = Block::ZERO;
        block
            .0
            .iter_mut()
            .zip(bytes.chunks_exact(8))
            .for_each(|(word, chunk)| {
                let mut le = [0u8; 8];
                le.copy_from_slice(chunk);
                *word = u64::from_le_bytes(le);
            });
        block
    }

    pub(crate) fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        let mut out = [0u8; BLOCK_SIZE];
        out.chunks_exact_mut(8)
            .zip(self.0.iter())
            .for_each(|(chunk, word)| chunk.copy_from_slice(&word.to_le_bytes()));
        out
    }

    /// Compression function G (RFC 9106 §3.5).
    ///
    /// Computes G(X, Y) = P(P(X ⊕ Y)) ⊕ X ⊕ Y, where P is a permutation
    /// based on the BLAKE2b round function. The permutation is applied
    /// twice: first on rows of 16 words, then on columns.
    ///
    /// This function provides the mixing that gives Argon2 its security
    /// properties. The XOR at the end ensures that information from both
    /// input blocks propagates to the output.
    pub(crate) fn compress(x: &Self, y: &Self) -> Self {
        let mut r = x.clone();
        r.in_place_xor(y);

        let mut z = r.clone();

        // Rows: P on 8 groups of 16 consecutive words
        for row in z.0.chunks_exact_mut(16) {
            let mut v = [0u64; 16];
            v.copy_from_slice(row);
            permute_p(&mut v);
            row.copy_from_slice(&v);
        }

        // Columns: P on 8 groups of word pairs strided by 16
        for i in 0..8 {
            let mut v = [0u64; 16];
            for (k, pair) in v.chunks_exact_mut(2).enumerate() {
                let base = 2 * i + 16 * k;
                pair[0] = z.0[base];
                pair[1] = z.0[base + 1];
            }

            permute_p(&mut v);

            for (k, pair) in v.chunks_exact(2).enumerate() {
                let base = 2 * i + 16 * k;
                z.0[base] = pair[0];
                z.0[base + 1] = pair[1];
            }
        }

        z.in_place_xor(&r);
        z
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::ZERO
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// GB mixing function (Argon2 variant of BLAKE2b's G).
///
/// Unlike the BLAKE2b G function which adds message words,
/// Argon2's GB function uses multiplication of the lower 32 bits to
/// achieve better diffusion. The formula for each step is:
///
/// ```text
/// a = a + b + 2 × trunc(a) × trunc(b)
/// d = (d ⊕ a) >>> rotation
/// ```
///
/// where trunc() extracts the lower 32 bits. The rotation amounts are
/// 32, 24, 16, and 63 bits respectively.
#[inline(always)]
fn gb(a: u64, b: u64, c: u64, d: u64) -> (u64, u64, u64, u64) {
    let a = bla_mka(a, b);
    let d = (d ^ a).rotate_right(32);

    let c = bla_mka(c, d);
    let b = (b ^ c).rotate_right(24);

    let a = bla_mka(a, b);
    let d = (d ^ a).rotate_right(16);

    let c = bla_mka(c, d);
    let b = (b ^ c).rotate_right(63);

    (a, b, c, d)
}

#[inline(always)]
fn bla_mka(x: u64, y: u64) -> u64 {
    let lo = u64::from(x as u32).wrapping_mul(u64::from(y as u32));
    x.wrapping_add(y).wrapping_add(lo.wrapping_mul(2))
}

/// P permutation: one round of the BLAKE2-like mixing.
///
/// Applies GB to a 4×4 matrix of 64-bit words, first along columns,
/// then along diagonals.
#[inline(always)]
fn permute_p(v: &mut [u64; 16]) {
    (v[0], v[4], v[8], v[12]) = gb(v[0], v[4], v[8], v[12]);
    (v[1], v[5], v[9], v[13]) = gb(v[1], v[5], v[9], v[13]);
    (v[2], v[6], v[10], v[14]) = gb(v[2], v[6], v[10], v[14]);
    (v[3], v[7], v[11], v[15]) = gb(v[3], v[7], v[11], v[15]);

    (v[0], v[5], v[10], v[15]) = gb(v[0], v[5], v[10], v[15]);
    (v[1], v[6], v[11], v[12]) = gb(v[1], v[6], v[11], v[12]);
    (v[2], v[7], v[8], v[13]) = gb(v[2], v[7], v[8], v[13]);
    (v[3], v[4], v[9], v[14]) = gb(v[3], v[4], v[9], v[14]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned(seed: u64) -> Block {
        let mut block = Block::ZERO;
        for (i, word) in block.0.iter_mut().enumerate() {
            *word = (i as u64 + 1).wrapping_mul(seed);
        }
        block
    }

    #[test]
    fn bytes_are_little_endian_words() {
        let block = patterned(0x0102_0304_0506_0708);
        let bytes = block.to_bytes();
        assert_eq!(&bytes[..8], &0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(Block::from_bytes(&bytes), block);
    }

    #[test]
    fn compress_of_zero_blocks_is_zero() {
        // P maps the all-zero state to itself.
        assert_eq!(Block::compress(&Block::ZERO, &Block::ZERO), Block::ZERO);
    }

    #[test]
    fn compress_is_symmetric_in_its_inputs() {
        let x = patterned(0x9E37_79B9_7F4A_7C15);
        let y = patterned(0xC2B2_AE3D_27D4_EB4F);
        assert_eq!(Block::compress(&x, &y), Block::compress(&y, &x));
    }

    #[test]
    fn single_bit_diffuses_across_block() {
        let x = patterned(3);
        let mut y = x.clone();
        y.0[77] ^= 1;

        let a = Block::compress(&x, &Block::ZERO);
        let b = Block::compress(&y, &Block::ZERO);

        let changed = a.0.iter().zip(b.0.iter()).filter(|(p, q)| p != q).count();
        assert!(changed > 120, "only {changed} words changed");
    }
}
