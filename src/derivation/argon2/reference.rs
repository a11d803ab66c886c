//! Reference block position computation for Argon2.
//!
//! When filling a block at position (lane, index), Argon2 needs to select
//! a reference block to mix with the previous block. The selection algorithm
//! uses pseudo-random values J1 and J2 to determine which block to reference,
//! with constraints to ensure the referenced block has already been computed.
//!
//! Where J1 and J2 come from depends on the addressing mode of the segment,
//! which is decided once per (pass, slice) by [`Addressing::for_segment`].

use super::block::{Block, QWORDS_IN_BLOCK};
use super::memory::MemoryLayout;
use super::params::{SYNC_POINTS, Variant};

/// Position of the segment currently being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub pass: u32,
    pub lane: u32,
    pub slice: u32,
}

/// Source of the pseudo-random words for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// Words come from address blocks that depend only on the position.
    DataIndependent,
    /// Words come from the first word of the previous block.
    DataDependent,
}

impl Addressing {
    /// Selects the addressing mode for a (pass, slice) pair.
    ///
    /// Argon2id uses data-independent addressing for the first two slices of
    /// the first pass and data-dependent addressing afterwards.
    pub(crate) fn for_segment(variant: Variant, pass: u32, slice: u32) -> Self {
        match variant {
            Variant::Argon2i => Addressing::DataIndependent,
            Variant::Argon2d => Addressing::DataDependent,
            Variant::Argon2id if pass == 0 && slice < SYNC_POINTS / 2 => {
                Addressing::DataIndependent
            }
            Variant::Argon2id => Addressing::DataDependent,
        }
    }
}

/// Generator of address blocks for data-independent addressing.
///
/// The address block is computed as G(0, G(0, Z)) where Z contains the
/// current position, the matrix size, the pass count, the variant, and a
/// counter that is bumped every 128 blocks.
pub(crate) struct AddressStream {
    input: Block,
    addresses: Block,
}

impl AddressStream {
    pub(crate) fn new(
        position: Position,
        total_blocks: u32,
        time: u32,
        variant: Variant,
    ) -> Self {
        let mut input = Block::ZERO;
        input.0[0] = u64::from(position.pass);
        input.0[1] = u64::from(position.lane);
        input.0[2] = u64::from(position.slice);
        input.0[3] = u64::from(total_blocks);
        input.0[4] = u64::from(time);
        input.0[5] = u64::from(variant.as_u32());

        Self {
            input,
            addresses: Block::ZERO,
        }
    }

    fn refill(&mut self) {
        self.input.0[6] += 1;
        let tmp = Block::compress(&Block::ZERO, &self.input);
        self.addresses = Block::compress(&Block::ZERO, &tmp);
    }

    /// Pseudo-random word for the block at `index_in_segment`.
    ///
    /// Indices must be requested in increasing order within a segment.
    pub(crate) fn word(&mut self, index_in_segment: u32) -> u64 {
        let slot = index_in_segment as usize % QWORDS_IN_BLOCK;
        // Segments that start at index 2 still need their first block.
        if slot == 0 || self.input.0[6] == 0 {
            self.refill();
        }
        self.addresses.0[slot]
    }
}

/// Computes the reference block position for the Argon2 filling algorithm.
///
/// Given the current position and the pseudo-random word, this function
/// determines which previously-computed block should be used as the second
/// input to the compression function G.
///
/// The algorithm (RFC 9106 §3.4.1.3) ensures that:
/// - On the first pass, first slice: only earlier blocks in the same lane
/// - Otherwise: blocks from any lane, but respecting slice boundaries
///
/// The mapping uses a non-uniform distribution (phi function) that biases
/// toward more recently computed blocks.
///
/// # Returns
///
/// A tuple `(reference_lane, reference_index)` identifying the block to use.
pub(crate) fn compute_reference_position(
    position: Position,
    index_in_segment: u32,
    layout: &MemoryLayout,
    pseudo_rand: u64,
) -> (u32, u32) {
    let Position { pass, slice, lane } = position;
    let segment_len = layout.segment_len;
    let lane_len = layout.lane_len;

    let j1 = pseudo_rand as u32;
    let j2 = (pseudo_rand >> 32) as u32;

    let ref_lane = if pass == 0 && slice == 0 {
        lane
    } else {
        j2 % layout.lanes
    };

    let same_lane = ref_lane == lane;

    // Blocks of other lanes are only visible up to the previous slice; the
    // very last of them is excluded while the first block of a segment is
    // being computed, since it is the previous block of that lane.
    let reference_area_size = if pass == 0 {
        if slice == 0 {
            index_in_segment - 1
        } else if same_lane {
            slice * segment_len + index_in_segment - 1
        } else if index_in_segment == 0 {
            slice * segment_len - 1
        } else {
            slice * segment_len
        }
    } else if same_lane {
        lane_len - segment_len + index_in_segment - 1
    } else if index_in_segment == 0 {
        lane_len - segment_len - 1
    } else {
        lane_len - segment_len
    };

    debug_assert!(reference_area_size > 0);

    // Phi function: x = J1² / 2³², relative_position = W - 1 - (W × x / 2³²)
    let area = u64::from(reference_area_size);
    let x = (u64::from(j1) * u64::from(j1)) >> 32;
    let relative_position = (area - 1 - ((area * x) >> 32)) as u32;

    let start_position = if pass == 0 || slice == SYNC_POINTS - 1 {
        0
    } else {
        (slice + 1) * segment_len
    };

    // The window wraps around the lane; the sum can exceed u32 for large lanes.
    let ref_index =
        ((u64::from(start_position) + u64::from(relative_position)) % u64::from(lane_len)) as u32;

    (ref_lane, ref_index)
}
