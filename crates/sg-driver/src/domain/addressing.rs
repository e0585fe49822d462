//! # Block Addressing
//!
//! Maps a byte range of a file onto the blocks and quadrants it touches.
//!
//! A file is a sequence of `BLOCK_SIZE` blocks; local block index `i`
//! covers bytes `[i * BLOCK_SIZE, (i + 1) * BLOCK_SIZE)`. Each block is
//! split into `QUADRANT_COUNT` quadrants of `QUADRANT_SIZE` bytes. A
//! quadrant-sized, quadrant-aligned access touches exactly one quadrant of
//! one block; anything else is split into per-block segments.

use crate::domain::types::{BLOCK_SIZE, QUADRANT_SIZE};
use std::ops::RangeInclusive;

/// Local block index holding byte `position`.
pub fn block_index(position: u64) -> u64 {
    position / BLOCK_SIZE as u64
}

/// Offset of byte `position` inside its block.
pub fn block_offset(position: u64) -> usize {
    (position % BLOCK_SIZE as u64) as usize
}

/// Quadrant of its block that byte `position` falls in.
pub fn quadrant_of(position: u64) -> usize {
    block_offset(position) / QUADRANT_SIZE
}

/// Byte offset of quadrant `quadrant` inside a block buffer.
pub fn quadrant_offset(quadrant: usize) -> usize {
    quadrant * QUADRANT_SIZE
}

/// The part of a byte range that falls inside a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSegment {
    /// Local block index within the file
    pub index: u64,
    /// First byte inside the block
    pub offset: usize,
    /// Bytes covered inside the block
    pub len: usize,
    /// Offset of this segment inside the caller's buffer
    pub buf_offset: usize,
}

impl BlockSegment {
    /// Quadrants touched by this segment.
    pub fn quadrants(&self) -> RangeInclusive<usize> {
        let first = self.offset / QUADRANT_SIZE;
        let last = (self.offset + self.len.max(1) - 1) / QUADRANT_SIZE;
        first..=last
    }

    /// True for the aligned single-quadrant case.
    pub fn is_single_quadrant(&self) -> bool {
        self.len == QUADRANT_SIZE && self.offset % QUADRANT_SIZE == 0
    }

    /// File position just past this segment.
    pub fn end_position(&self) -> u64 {
        self.index * BLOCK_SIZE as u64 + (self.offset + self.len) as u64
    }
}

/// Split `len` bytes starting at file position `start` into per-block
/// segments, in file order.
///
/// `None` when the range runs past `u64::MAX`. Every segment returned ends
/// at or before `start + len`.
pub fn segments(start: u64, len: usize) -> Option<Vec<BlockSegment>> {
    start.checked_add(len as u64)?;

    let mut out = Vec::with_capacity(len / BLOCK_SIZE + 2);
    let mut position = start;
    let mut done = 0usize;

    while done < len {
        let offset = block_offset(position);
        let take = (BLOCK_SIZE - offset).min(len - done);
        out.push(BlockSegment {
            index: block_index(position),
            offset,
            len: take,
            buf_offset: done,
        });
        done += take;
        position += take as u64;
    }

    Some(out)
}
