//! BLAKE2b and the variable-length hash H' (RFC 9106 §3.3).

use blake2::Blake2bVar;
use blake2::digest::{Update, VariableOutput};
use zeroize::Zeroizing;

/// Largest digest BLAKE2b produces in a single invocation.
pub(crate) const BLAKE2B_OUTBYTES: usize = 64;

/// Half of a BLAKE2b digest, the stride of the H' output chain.
const HALF_OUTBYTES: usize = BLAKE2B_OUTBYTES / 2;

/// The BLAKE2b primitive rejected a request.
///
/// Every size passed by this module is in range, so this only surfaces
/// when the contract with the underlying primitive is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    /// Requested digest length is not accepted by BLAKE2b.
    #[error("unsupported BLAKE2b output length: {0}")]
    OutputSize(usize),
    /// Requested H' output does not fit a 32-bit length prefix.
    #[error("H' output length {0} exceeds 2^32 - 1")]
    OutputTooLong(usize),
}

/// Hashes the concatenation of `inputs` into `out` with BLAKE2b, using
/// `out.len()` (1..=64) as the digest length.
pub(crate) fn blake2b(inputs: &[&[u8]], out: &mut [u8]) -> Result<(), HashError> {
    let mut hasher =
        Blake2bVar::new(out.len()).map_err(|_| HashError::OutputSize(out.len()))?;
    for input in inputs {
        hasher.update(input);
    }
    hasher
        .finalize_variable(out)
        .map_err(|_| HashError::OutputSize(out.len()))
}

/// Variable-length hash function H'.
///
/// Outputs of up to 64 bytes are a single BLAKE2b call over
/// `LE32(T) || X`. Longer outputs chain 64-byte digests and keep the first
/// half of each one, with a final digest sized to cover the remainder:
///
/// ```text
/// V1     = BLAKE2b-64(LE32(T) || X)
/// V(i+1) = BLAKE2b-64(Vi)
/// H'(X)  = V1[..32] || ... || Vr[..32] || BLAKE2b-(T - 32r)(Vr)
/// ```
pub(crate) fn blake2b_long(inputs: &[&[u8]], out: &mut [u8]) -> Result<(), HashError> {
    let tag_len = u32::try_from(out.len()).map_err(|_| HashError::OutputTooLong(out.len()))?;
    let len_prefix = tag_len.to_le_bytes();

    let mut prefixed = Vec::with_capacity(inputs.len() + 1);
    prefixed.push(&len_prefix[..]);
    prefixed.extend_from_slice(inputs);

    if out.len() <= BLAKE2B_OUTBYTES {
        return blake2b(&prefixed, out);
    }

    // Both chain buffers are wiped on drop, including on early return.
    let mut v = Zeroizing::new([0u8; BLAKE2B_OUTBYTES]);
    let mut next = Zeroizing::new([0u8; BLAKE2B_OUTBYTES]);

    blake2b(&prefixed, &mut v[..])?;
    out[..HALF_OUTBYTES].copy_from_slice(&v[..HALF_OUTBYTES]);

    let mut offset = HALF_OUTBYTES;
    while out.len() - offset > BLAKE2B_OUTBYTES {
        blake2b(&[&v[..]], &mut next[..])?;
        core::mem::swap(&mut v, &mut next);
        out[offset..offset + HALF_OUTBYTES].copy_from_slice(&v[..HALF_OUTBYTES]);
        offset += HALF_OUTBYTES;
    }

    blake2b(&[&v[..]], &mut out[offset..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_is_prefixed_blake2b() {
        let mut direct = [0u8; 32];
        blake2b(&[&32u32.to_le_bytes()[..], &b"abc"[..]], &mut direct).unwrap();

        let mut long = [0u8; 32];
        blake2b_long(&[&b"abc"[..]], &mut long).unwrap();

        assert_eq!(direct, long);
    }

    #[test]
    fn long_output_shares_prefix_with_first_digest() {
        let mut v1 = [0u8; 64];
        blake2b(&[&1024u32.to_le_bytes()[..], &b"seed"[..]], &mut v1).unwrap();

        let mut out = [0u8; 1024];
        blake2b_long(&[&b"seed"[..]], &mut out).unwrap();

        assert_eq!(&out[..32], &v1[..32]);
    }

    #[test]
    fn split_inputs_hash_like_concatenation() {
        let mut a = [0u8; 100];
        let mut b = [0u8; 100];
        blake2b_long(&[&b"hello "[..], &b"world"[..]], &mut a).unwrap();
        blake2b_long(&[&b"hello world"[..]], &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chain_follows_rfc_construction() {
        // 160 bytes: V1[..32] || V2[..32] || V3[..32] || BLAKE2b-64(V3).
        let mut v1 = [0u8; 64];
        blake2b(&[&160u32.to_le_bytes()[..], &b"chain"[..]], &mut v1).unwrap();
        let mut v2 = [0u8; 64];
        blake2b(&[&v1[..]], &mut v2).unwrap();
        let mut v3 = [0u8; 64];
        blake2b(&[&v2[..]], &mut v3).unwrap();
        let mut v4 = [0u8; 64];
        blake2b(&[&v3[..]], &mut v4).unwrap();

        let mut out = [0u8; 160];
        blake2b_long(&[&b"chain"[..]], &mut out).unwrap();

        assert_eq!(&out[..32], &v1[..32]);
        assert_eq!(&out[32..64], &v2[..32]);
        assert_eq!(&out[64..96], &v3[..32]);
        assert_eq!(&out[96..], &v4[..]);
    }

    #[test]
    fn odd_lengths_fill_whole_buffer() {
        for len in [65usize, 95, 96, 97, 129, 1000] {
            let mut out = vec![0u8; len];
            blake2b_long(&[&b"x"[..]], &mut out).unwrap();
            assert!(out[len - 32..].iter().any(|&b| b != 0), "len {len}");
        }
    }
}
