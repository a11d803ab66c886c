//! Memory organization and filling algorithm for Argon2.
//!
//! This module implements the core memory-filling loop of Argon2. Memory
//! is organized as a matrix of lanes (rows) and columns, with each cell
//! containing a 1024-byte block. Lanes can be processed independently
//! within each slice, enabling parallelism.
//!
//! Before each slice the matrix is split into one mutable segment per lane
//! and read-only views of everything outside the current slice. Workers
//! only ever write their own segments, and the end of the thread scope is
//! the barrier between slices.

use std::sync::atomic::{AtomicBool, Ordering};

use super::block::Block;
use super::core::Argon2Error;
use super::params::{MIN_MEMORY_PER_LANE, SYNC_POINTS, Variant, Version};
use super::reference::{AddressStream, Addressing, Position, compute_reference_position};

/// Memory layout parameters for Argon2.
///
/// The memory is organized as follows:
/// - Total memory is divided into `lanes` independent rows.
/// - Each lane contains `lane_len` blocks.
/// - Each lane is divided into 4 slices (sync points).
/// - Each slice contains `segment_len` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemoryLayout {
    pub lanes: u32,
    pub lane_len: u32,
    pub segment_len: u32,
    pub total_blocks: u32,
}

impl MemoryLayout {
    /// Rounds `mem_kib` down to a whole number of segments per lane, never
    /// going below two blocks per segment.
    pub(crate) fn new(mem_kib: u32, lanes: u32) -> Self {
        let mem_kib = mem_kib.max(MIN_MEMORY_PER_LANE * lanes);
        let segment_len = mem_kib / (SYNC_POINTS * lanes);
        let lane_len = segment_len * SYNC_POINTS;

        Self {
            lanes,
            lane_len,
            segment_len,
            total_blocks: lane_len * lanes,
        }
    }

    #[inline]
    pub(crate) fn index(&self, lane: u32, index_in_lane: u32) -> usize {
        lane as usize * self.lane_len as usize + index_in_lane as usize
    }
}

/// How the matrix gets filled: everything besides the layout that the
/// schedule depends on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FillPlan<'a> {
    pub variant: Variant,
    pub version: Version,
    pub time: u32,
    pub threads: usize,
    pub cancel: Option<&'a AtomicBool>,
}

impl FillPlan<'_> {
    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Acquire))
    }
}

/// The block matrix of a single derivation.
///
/// Blocks are stored row-major by lane. Dropping the matrix zeroes every
/// block.
pub(crate) struct Matrix {
    layout: MemoryLayout,
    blocks: Vec<Block>,
}

impl Matrix {
    /// Reserves and zero-initializes the whole matrix.
    pub(crate) fn allocate(layout: MemoryLayout) -> Result<Self, Argon2Error> {
        let total = layout.total_blocks as usize;
        let mut blocks = reserve_blocks(total)?;
        blocks.resize(total, Block::ZERO);

        Ok(Self { layout, blocks })
    }

    pub(crate) fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub(crate) fn block(&self, lane: u32, index_in_lane: u32) -> &Block {
        &self.blocks[self.layout.index(lane, index_in_lane)]
    }

    pub(crate) fn block_mut(&mut self, lane: u32, index_in_lane: u32) -> &mut Block {
        let idx = self.layout.index(lane, index_in_lane);
        &mut self.blocks[idx]
    }

    /// XOR of the last block of every lane.
    pub(crate) fn last_column(&self) -> Block {
        let mut out = Block::ZERO;
        for lane in 0..self.layout.lanes {
            out.in_place_xor(self.block(lane, self.layout.lane_len - 1));
        }
        out
    }

    /// Fills all memory blocks over the specified number of passes.
    ///
    /// Each pass iterates through all 4 slices in order. Within each slice,
    /// all lanes are processed, on up to `plan.threads` workers. The slice
    /// boundaries act as synchronization points: a lane can only reference
    /// blocks from other lanes that were completed in previous slices.
    ///
    /// Cancellation is only observed between slices.
    pub(crate) fn fill(&mut self, plan: &FillPlan<'_>) -> Result<(), Argon2Error> {
        let layout = self.layout;
        let threads = plan.threads.clamp(1, layout.lanes as usize);

        for pass in 0..plan.time {
            for slice in 0..SYNC_POINTS {
                let addressing = Addressing::for_segment(plan.variant, pass, slice);
                let (mut segments, frozen) = self.split_slice(slice);
                let job = SliceJob {
                    layout: &layout,
                    plan,
                    pass,
                    slice,
                    addressing,
                    frozen: &frozen,
                };

                if threads == 1 {
                    segments.iter_mut().for_each(|segment| job.fill_segment(segment));
                } else {
                    let per_worker = segments.len().div_ceil(threads);
                    std::thread::scope(|scope| {
                        for batch in segments.chunks_mut(per_worker) {
                            let job = &job;
                            scope.spawn(move || {
                                batch.iter_mut().for_each(|segment| job.fill_segment(segment));
                            });
                        }
                    });
                }

                if plan.cancelled() {
                    tracing::debug!(pass, slice, "derivation cancelled at slice boundary");
                    return Err(Argon2Error::Cancelled);
                }
            }

            tracing::trace!(pass, "pass complete");
        }

        Ok(())
    }

    /// Splits every lane around `slice` into its writable segment and the
    /// read-only blocks before and after it.
    fn split_slice(&mut self, slice: u32) -> (Vec<Segment<'_>>, Vec<Frozen<'_>>) {
        let lanes = self.layout.lanes as usize;
        let segment_len = self.layout.segment_len as usize;
        let start = slice as usize * segment_len;

        let mut segments = Vec::with_capacity(lanes);
        let mut frozen = Vec::with_capacity(lanes);

        for (lane, row) in self
            .blocks
            .chunks_mut(self.layout.lane_len as usize)
            .enumerate()
        {
            let (head, rest) = row.split_at_mut(start);
            let (blocks, tail) = rest.split_at_mut(segment_len);
            segments.push(Segment {
                lane: lane as u32,
                blocks,
            });
            frozen.push(Frozen { head, tail });
        }

        (segments, frozen)
    }
}

/// Reserves room for `total` blocks, reporting failure instead of
/// aborting.
fn reserve_blocks(total: usize) -> Result<Vec<Block>, Argon2Error> {
    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(total)
        .map_err(|_| Argon2Error::AllocationFailure { blocks: total })?;
    Ok(blocks)
}

/// Blocks of one lane outside the slice being filled.
struct Frozen<'a> {
    head: &'a [Block],
    tail: &'a [Block],
}

/// The segment of one lane inside the slice being filled.
struct Segment<'a> {
    lane: u32,
    blocks: &'a mut [Block],
}

/// Shared state of all workers filling one slice.
struct SliceJob<'a, 'm> {
    layout: &'a MemoryLayout,
    plan: &'a FillPlan<'a>,
    pass: u32,
    slice: u32,
    addressing: Addressing,
    frozen: &'a [Frozen<'m>],
}

impl SliceJob<'_, '_> {
    /// Fills one segment (portion of a lane within a slice).
    ///
    /// For each block position, this function:
    /// 1. Takes the pseudo-random word from the address stream or the
    ///    previous block
    /// 2. Computes the reference block position from it
    /// 3. Computes the new block as G(previous, reference), XORed into the
    ///    existing block on later passes of version 1.3
    fn fill_segment(&self, segment: &mut Segment<'_>) {
        let position = Position {
            pass: self.pass,
            lane: segment.lane,
            slice: self.slice,
        };
        let layout = self.layout;

        let mut addresses = match self.addressing {
            Addressing::DataIndependent => Some(AddressStream::new(
                position,
                layout.total_blocks,
                self.plan.time,
                self.plan.variant,
            )),
            Addressing::DataDependent => None,
        };

        let overwrite = self.pass == 0 || self.plan.version == Version::V0x10;
        let start_idx = if self.pass == 0 && self.slice == 0 { 2 } else { 0 };

        for i in start_idx..layout.segment_len {
            let index_in_lane = self.slice * layout.segment_len + i;

            let prev_idx = if index_in_lane == 0 {
                layout.lane_len - 1
            } else {
                index_in_lane - 1
            };

            let prev = self.read(segment, segment.lane, prev_idx);
            let pseudo_rand = match addresses.as_mut() {
                Some(stream) => stream.word(i),
                None => prev.0[0],
            };

            let (ref_lane, ref_idx) =
                compute_reference_position(position, i, layout, pseudo_rand);
            let reference = self.read(segment, ref_lane, ref_idx);

            let next = Block::compress(prev, reference);
            let current = &mut segment.blocks[i as usize];
            if overwrite {
                *current = next;
            } else {
                current.in_place_xor(&next);
            }
        }
    }

    /// Resolves a block of any lane during this slice.
    ///
    /// Only the lane that owns the segment may look inside it; anything
    /// else would observe a block that another worker is still writing.
    fn read<'s>(&'s self, segment: &'s Segment<'_>, lane: u32, index_in_lane: u32) -> &'s Block {
        let start = self.slice * self.layout.segment_len;
        let end = start + self.layout.segment_len;
        let views = &self.frozen[lane as usize];

        if index_in_lane < start {
            &views.head[index_in_lane as usize]
        } else if index_in_lane >= end {
            &views.tail[(index_in_lane - end) as usize]
        } else {
            assert_eq!(
                lane, segment.lane,
                "lane {} referenced the unfinished segment of lane {lane}",
                segment.lane
            );
            &segment.blocks[(index_in_lane - start) as usize]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_rounds_down_to_whole_segments() {
        let layout = MemoryLayout::new(37, 2);
        assert_eq!(layout.segment_len, 4);
        assert_eq!(layout.lane_len, 16);
        assert_eq!(layout.total_blocks, 32);
    }

    #[test]
    fn layout_keeps_two_blocks_per_segment() {
        let layout = MemoryLayout::new(8, 1);
        assert_eq!(layout.segment_len, 2);
        assert_eq!(layout.total_blocks, 8);
    }

    #[test]
    fn index_is_row_major_by_lane() {
        let layout = MemoryLayout::new(64, 4);
        assert_eq!(layout.index(0, 0), 0);
        assert_eq!(layout.index(1, 0), 16);
        assert_eq!(layout.index(3, 15), 63);
    }

    #[test]
    fn split_slice_partitions_every_lane() {
        let mut matrix = Matrix::allocate(MemoryLayout::new(64, 4)).unwrap();
        let (segments, frozen) = matrix.split_slice(2);
        assert_eq!(segments.len(), 4);
        for (segment, views) in segments.iter().zip(frozen.iter()) {
            assert_eq!(views.head.len(), 8);
            assert_eq!(segment.blocks.len(), 4);
            assert_eq!(views.tail.len(), 4);
        }
    }

    #[test]
    fn oversized_reservation_is_an_error() {
        // usize::MAX blocks overflow the address space before any memory is touched.
        let result = reserve_blocks(usize::MAX);
        assert!(matches!(
            result,
            Err(Argon2Error::AllocationFailure { blocks: usize::MAX })
        ));
    }

    #[test]
    fn raised_flag_stops_after_first_slice() {
        let mut matrix = Matrix::allocate(MemoryLayout::new(32, 1)).unwrap();
        *matrix.block_mut(0, 0) = Block([1; 128]);
        *matrix.block_mut(0, 1) = Block([2; 128]);

        let flag = AtomicBool::new(true);
        let plan = FillPlan {
            variant: Variant::Argon2d,
            version: Version::V0x13,
            time: 3,
            threads: 1,
            cancel: Some(&flag),
        };

        assert!(matches!(matrix.fill(&plan), Err(Argon2Error::Cancelled)));
        // First slice was completed, the second never started.
        assert_ne!(matrix.block(0, 7), &Block::ZERO);
        assert_eq!(matrix.block(0, 8), &Block::ZERO);
    }
}
