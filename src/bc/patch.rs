//! Geometric realization of a boundary surface for point matching.

use crate::bc::surface::{BoundarySurface, Face};
use crate::geometry::{Point3, StructuredBlock};

/// A surface realized in physical space: its four corner points plus enough
/// bookkeeping to build an interblock record once matched.
///
/// Corners are ordered origin (dir1 min, dir2 min), corner1 (dir1 max),
/// corner2 (dir2 max), corner12 (both max). Orientation determination relies
/// on this order. Patches are built on demand and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    origin: Point3,
    corner1: Point3,
    corner2: Point3,
    corner12: Point3,
    face: Face,
    block: usize,
    rank: usize,
    local_block: usize,
    d1_range: [usize; 2],
    d2_range: [usize; 2],
    const_index: usize,
    tag: i32,
    /// Edge flags in (dir1 start, dir1 end, dir2 start, dir2 end) order;
    /// true when the edge abuts another patch (internal seam).
    border: [bool; 4],
}

impl Patch {
    /// Realize `surf` on `geom`. `rank` and `local_block` come from the
    /// current decomposition; pass zeros when no decomposition exists yet.
    pub fn new(
        surf: &BoundarySurface,
        geom: &StructuredBlock,
        block: usize,
        border: [bool; 4],
        rank: usize,
        local_block: usize,
    ) -> Self {
        let face = surf.face();
        let (d1, d2) = face.in_plane();
        let n = face.normal;
        let c = surf.const_index();
        let [a0, a1] = surf.range(d1);
        let [b0, b1] = surf.range(d2);

        let node_at = |a: usize, b: usize| {
            let mut idx = [0usize; 3];
            idx[n.index()] = c;
            idx[d1.index()] = a;
            idx[d2.index()] = b;
            geom.node(idx[0], idx[1], idx[2])
        };

        Self {
            origin: node_at(a0, b0),
            corner1: node_at(a1, b0),
            corner2: node_at(a0, b1),
            corner12: node_at(a1, b1),
            face,
            block,
            rank,
            local_block,
            d1_range: [a0, a1],
            d2_range: [b0, b1],
            const_index: c,
            tag: surf.tag(),
            border,
        }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }
    pub fn corner1(&self) -> Point3 {
        self.corner1
    }
    pub fn corner2(&self) -> Point3 {
        self.corner2
    }
    pub fn corner12(&self) -> Point3 {
        self.corner12
    }

    /// Corners in (origin, corner1, corner2, corner12) order.
    pub fn corners(&self) -> [Point3; 4] {
        [self.origin, self.corner1, self.corner2, self.corner12]
    }

    pub fn face(&self) -> Face {
        self.face
    }
    pub fn block(&self) -> usize {
        self.block
    }
    pub fn rank(&self) -> usize {
        self.rank
    }
    pub fn local_block(&self) -> usize {
        self.local_block
    }
    pub fn dir1_range(&self) -> [usize; 2] {
        self.d1_range
    }
    pub fn dir2_range(&self) -> [usize; 2] {
        self.d2_range
    }
    pub fn const_index(&self) -> usize {
        self.const_index
    }
    pub fn tag(&self) -> i32 {
        self.tag
    }
    pub fn border(&self) -> [bool; 4] {
        self.border
    }

    pub fn dir1_len(&self) -> usize {
        self.d1_range[1] - self.d1_range[0]
    }
    pub fn dir2_len(&self) -> usize {
        self.d2_range[1] - self.d2_range[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Axis, StructuredBlock};

    #[test]
    fn corners_follow_dir_convention() {
        let geom = StructuredBlock::unit([4, 6, 8]);
        // i-max face: dir1 = j, dir2 = k.
        let s = BoundarySurface::new("interblock", [[4, 4], [1, 5], [2, 7]], 3).unwrap();
        let p = Patch::new(&s, &geom, 0, [false; 4], 0, 0);
        assert_eq!(p.origin(), [4.0, 1.0, 2.0]);
        assert_eq!(p.corner1(), [4.0, 5.0, 2.0]);
        assert_eq!(p.corner2(), [4.0, 1.0, 7.0]);
        assert_eq!(p.corner12(), [4.0, 5.0, 7.0]);
        assert_eq!(p.face().normal, Axis::I);
        assert_eq!(p.dir1_len(), 4);
        assert_eq!(p.dir2_len(), 5);
    }
}
