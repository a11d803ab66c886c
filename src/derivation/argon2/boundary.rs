//! Initialization and finalization for Argon2.
//!
//! This module handles the boundary operations of the Argon2 algorithm:
//! computing the initial hash H0 from all inputs, seeding the first two
//! blocks of every lane, and deriving the final tag from the filled memory.

use zeroize::Zeroize;

use super::block::{BLOCK_SIZE, Block};
use super::core::Argon2Error;
use super::memory::Matrix;
use super::params::{Argon2Params, check_input_len};
use crate::hash::blake2b::{BLAKE2B_OUTBYTES, blake2b};
use crate::hash::blake2b_long;

/// Initial hash H0 as produced by [`init`].
pub(crate) type Seed = [u8; BLAKE2B_OUTBYTES];

/// Computes the initial hash H0 from all Argon2 inputs.
///
/// H0 is a 64-byte BLAKE2b hash of the concatenation of all parameters
/// and inputs, each prefixed with its length. This ensures that all
/// inputs influence the entire computation and provides domain separation.
///
/// The input format is defined in RFC 9106 §3.2:
/// ```text
/// H0 = BLAKE2b(p || T || m || t || v || y || |P| || P || |S| || S || |K| || K || |X| || X)
/// ```
///
/// `m` is the memory cost exactly as requested, before rounding to whole
/// segments.
pub(crate) fn init(
    password: &[u8],
    salt: &[u8],
    params: &Argon2Params,
    tag_len: u32,
) -> Result<Seed, Argon2Error> {
    let secret: &[u8] = params.secret.as_deref().map_or(&[][..], Vec::as_slice);
    let ad = params.associated_data.as_deref().unwrap_or_default();

    let header = [
        params.lanes,
        tag_len,
        params.mem_kib,
        params.time,
        params.version.as_u32(),
        params.variant.as_u32(),
    ]
    .map(u32::to_le_bytes);

    let pwd_len = check_input_len("password", password.len())?.to_le_bytes();
    let salt_len = check_input_len("salt", salt.len())?.to_le_bytes();
    let secret_len = check_input_len("secret", secret.len())?.to_le_bytes();
    let ad_len = check_input_len("associated data", ad.len())?.to_le_bytes();

    let mut inputs: Vec<&[u8]> = header.iter().map(|field| &field[..]).collect();
    inputs.extend_from_slice(&[
        &pwd_len[..],
        password,
        &salt_len[..],
        salt,
        &secret_len[..],
        secret,
        &ad_len[..],
        ad,
    ]);

    let mut h0 = [0u8; BLAKE2B_OUTBYTES];
    blake2b(&inputs, &mut h0)?;
    Ok(h0)
}

/// Seeds the first two blocks of every lane:
/// `B[i][j] = H'^(1024)(H0 || LE32(j) || LE32(i))`.
pub(crate) fn seed_lanes(matrix: &mut Matrix, h0: &Seed) -> Result<(), Argon2Error> {
    let mut bytes = [0u8; BLOCK_SIZE];

    for lane in 0..matrix.layout().lanes {
        for column in 0..2u32 {
            blake2b_long(
                &[&h0[..], &column.to_le_bytes()[..], &lane.to_le_bytes()[..]],
                &mut bytes,
            )?;
            *matrix.block_mut(lane, column) = Block::from_bytes(&bytes);
        }
    }

    bytes.zeroize();
    Ok(())
}

/// Finalizes the Argon2 computation to produce the output tag.
///
/// The finalization XORs together the last block of each lane (forming
/// a single 1024-byte block), then applies the variable-length hash
/// function H' to produce the final tag of the requested length.
///
/// This construction ensures that all lanes contribute to the final
/// output, preventing attackers from skipping lane computations.
pub(crate) fn finalize(matrix: &Matrix, out: &mut [u8]) -> Result<(), Argon2Error> {
    let final_block = matrix.last_column();
    let mut bytes = final_block.to_bytes();
    let result = blake2b_long(&[&bytes[..]], out);
    bytes.zeroize();
    Ok(result?)
}
