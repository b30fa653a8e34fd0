//! A matched pair of patches: the wire-level contract for ghost exchange.

use crate::bc::Patch;
use crate::topology::orientation::Orientation;
use std::fmt;

/// One discovered point-matched connection between two patches, possibly on
/// different ranks.
///
/// Per-side data is stored in two-element arrays with side 0 the "first"
/// patch and side 1 the "second"; orientation and parity logic depend on
/// this convention staying fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Interblock {
    rank: [usize; 2],
    block: [usize; 2],
    local_block: [usize; 2],
    face: [u8; 2],
    d1_start: [usize; 2],
    d1_end: [usize; 2],
    d2_start: [usize; 2],
    d2_end: [usize; 2],
    const_index: [usize; 2],
    /// Sides 0..4 are the first patch's edge flags, 4..8 the second's.
    border: [bool; 8],
    orientation: Orientation,
}

impl Interblock {
    /// Wrap a matched pair. The caller has already verified the corner
    /// correspondence that produced `orientation`.
    pub fn new(first: &Patch, second: &Patch, orientation: Orientation) -> Self {
        let fb = first.border();
        let sb = second.border();
        Self {
            rank: [first.rank(), second.rank()],
            block: [first.block(), second.block()],
            local_block: [first.local_block(), second.local_block()],
            face: [first.face().id(), second.face().id()],
            d1_start: [first.dir1_range()[0], second.dir1_range()[0]],
            d1_end: [first.dir1_range()[1], second.dir1_range()[1]],
            d2_start: [first.dir2_range()[0], second.dir2_range()[0]],
            d2_end: [first.dir2_range()[1], second.dir2_range()[1]],
            const_index: [first.const_index(), second.const_index()],
            border: [
                fb[0], fb[1], fb[2], fb[3], sb[0], sb[1], sb[2], sb[3],
            ],
            orientation,
        }
    }

    pub fn rank_first(&self) -> usize {
        self.rank[0]
    }
    pub fn rank_second(&self) -> usize {
        self.rank[1]
    }
    pub fn block_first(&self) -> usize {
        self.block[0]
    }
    pub fn block_second(&self) -> usize {
        self.block[1]
    }
    pub fn local_block_first(&self) -> usize {
        self.local_block[0]
    }
    pub fn local_block_second(&self) -> usize {
        self.local_block[1]
    }
    pub fn face_first(&self) -> u8 {
        self.face[0]
    }
    pub fn face_second(&self) -> u8 {
        self.face[1]
    }
    pub fn dir1_start_first(&self) -> usize {
        self.d1_start[0]
    }
    pub fn dir1_start_second(&self) -> usize {
        self.d1_start[1]
    }
    pub fn dir1_end_first(&self) -> usize {
        self.d1_end[0]
    }
    pub fn dir1_end_second(&self) -> usize {
        self.d1_end[1]
    }
    pub fn dir2_start_first(&self) -> usize {
        self.d2_start[0]
    }
    pub fn dir2_start_second(&self) -> usize {
        self.d2_start[1]
    }
    pub fn dir2_end_first(&self) -> usize {
        self.d2_end[0]
    }
    pub fn dir2_end_second(&self) -> usize {
        self.d2_end[1]
    }
    pub fn const_index_first(&self) -> usize {
        self.const_index[0]
    }
    pub fn const_index_second(&self) -> usize {
        self.const_index[1]
    }
    pub fn border(&self) -> [bool; 8] {
        self.border
    }
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn dir1_len_first(&self) -> usize {
        self.d1_end[0] - self.d1_start[0]
    }
    pub fn dir1_len_second(&self) -> usize {
        self.d1_end[1] - self.d1_start[1]
    }
    pub fn dir2_len_first(&self) -> usize {
        self.d2_end[0] - self.d2_start[0]
    }
    pub fn dir2_len_second(&self) -> usize {
        self.d2_end[1] - self.d2_start[1]
    }

    pub fn is_lower_first(&self) -> bool {
        self.face[0] % 2 == 1
    }
    pub fn is_lower_second(&self) -> bool {
        self.face[1] % 2 == 1
    }

    /// Both sides minimum faces or both maximum faces of their blocks
    /// (face-id parity).
    pub fn is_lower_lower_or_upper_upper(&self) -> bool {
        (self.face[0] + self.face[1]) % 2 == 0
    }

    /// Swap which patch is "first"; the orientation becomes its inverse.
    pub fn swap_order(&mut self) {
        self.rank.swap(0, 1);
        self.block.swap(0, 1);
        self.local_block.swap(0, 1);
        self.face.swap(0, 1);
        self.d1_start.swap(0, 1);
        self.d1_end.swap(0, 1);
        self.d2_start.swap(0, 1);
        self.d2_end.swap(0, 1);
        self.const_index.swap(0, 1);
        self.border.rotate_left(4);
        self.orientation = self.orientation.inverse();
    }

    /// Rebuild from raw per-side fields (used when decoding wire records).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_raw(
        rank: [usize; 2],
        block: [usize; 2],
        local_block: [usize; 2],
        face: [u8; 2],
        d1_start: [usize; 2],
        d1_end: [usize; 2],
        d2_start: [usize; 2],
        d2_end: [usize; 2],
        const_index: [usize; 2],
        border: [bool; 8],
        orientation: Orientation,
    ) -> Self {
        Self {
            rank,
            block,
            local_block,
            face,
            d1_start,
            d1_end,
            d2_start,
            d2_end,
            const_index,
            border,
            orientation,
        }
    }
}

impl fmt::Display for Interblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} face {} (rank {}, slot {}) <-> block {} face {} (rank {}, slot {}), \
             orientation {}",
            self.block[0],
            self.face[0],
            self.rank[0],
            self.local_block[0],
            self.block[1],
            self.face[1],
            self.rank[1],
            self.local_block[1],
            self.orientation
        )
    }
}
