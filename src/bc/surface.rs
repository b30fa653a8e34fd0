//! One tagged rectangular region on a block face.

use crate::error::MeshDecompError;
use crate::geometry::Axis;
use crate::topology::orientation::{InPlaneDir, Orientation};
use std::fmt;

/// Which side of the block a face sits on along its normal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Lower,
    Upper,
}

/// An axis-aligned block face: normal axis plus side.
///
/// Face ids follow the fixed 1..=6 numbering (i-min=1, i-max=2, j-min=3,
/// j-max=4, k-min=5, k-max=6); the parity test for lower/lower and
/// upper/upper matches depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub normal: Axis,
    pub side: Side,
}

impl Face {
    #[inline]
    pub fn id(self) -> u8 {
        let base = 2 * self.normal.index() as u8 + 1;
        match self.side {
            Side::Lower => base,
            Side::Upper => base + 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Face> {
        if !(1..=6).contains(&id) {
            return None;
        }
        let normal = Axis::from_index(((id - 1) / 2) as usize)?;
        let side = if id % 2 == 1 { Side::Lower } else { Side::Upper };
        Some(Face { normal, side })
    }

    /// In-plane directions of the face, in the fixed (dir1, dir2) convention.
    #[inline]
    pub fn in_plane(self) -> (Axis, Axis) {
        self.normal.orthogonal()
    }
}

/// How a single surface partitions under a block split.
#[derive(Debug, Clone)]
pub(crate) enum SurfaceSplit {
    /// Entirely below the cut; ranges unchanged.
    Lower(BoundarySurface),
    /// Entirely above the cut; split-axis range re-indexed to the upper block.
    Upper(BoundarySurface),
    /// Spans the cut; clipped copies land on both sides.
    Both {
        lower: BoundarySurface,
        upper: BoundarySurface,
    },
}

/// One tagged rectangular region on a block's index space.
///
/// Ranges are face/node indices `[min, max]` per axis; exactly one axis is
/// degenerate (`min == max`) and is the face normal. The tag cross-references
/// the point-matched partner surface for connection types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundarySurface {
    bc_type: String,
    ranges: [[usize; 2]; 3],
    tag: i32,
}

impl BoundarySurface {
    pub fn new(
        bc_type: impl Into<String>,
        ranges: [[usize; 2]; 3],
        tag: i32,
    ) -> Result<Self, MeshDecompError> {
        let bc_type = bc_type.into();
        let surf = Self {
            bc_type,
            ranges,
            tag,
        };
        let degenerate = Axis::ALL
            .iter()
            .filter(|d| {
                let [lo, hi] = surf.ranges[d.index()];
                lo == hi
            })
            .count();
        let ordered = Axis::ALL.iter().all(|d| {
            let [lo, hi] = surf.ranges[d.index()];
            lo <= hi
        });
        if degenerate != 1 || !ordered {
            return Err(MeshDecompError::InvalidSurface(format!("{surf}")));
        }
        Ok(surf)
    }

    #[inline]
    pub fn bc_type(&self) -> &str {
        &self.bc_type
    }

    #[inline]
    pub fn tag(&self) -> i32 {
        self.tag
    }

    #[inline]
    pub fn is_connection(&self) -> bool {
        super::is_connection(&self.bc_type)
    }

    /// `[min, max]` index range along one axis.
    #[inline]
    pub fn range(&self, axis: Axis) -> [usize; 2] {
        self.ranges[axis.index()]
    }

    pub fn i_min(&self) -> usize {
        self.ranges[0][0]
    }
    pub fn i_max(&self) -> usize {
        self.ranges[0][1]
    }
    pub fn j_min(&self) -> usize {
        self.ranges[1][0]
    }
    pub fn j_max(&self) -> usize {
        self.ranges[1][1]
    }
    pub fn k_min(&self) -> usize {
        self.ranges[2][0]
    }
    pub fn k_max(&self) -> usize {
        self.ranges[2][1]
    }

    /// The degenerate axis (face normal).
    pub fn normal_axis(&self) -> Axis {
        // Constructor guarantees exactly one degenerate range.
        *Axis::ALL
            .iter()
            .find(|d| {
                let [lo, hi] = self.ranges[d.index()];
                lo == hi
            })
            .unwrap_or(&Axis::I)
    }

    /// Constant index along the face normal.
    pub fn const_index(&self) -> usize {
        self.ranges[self.normal_axis().index()][0]
    }

    /// Which block face this surface sits on. A surface at constant index 0
    /// is on the lower face; any other constant index is treated as the
    /// upper face (boundary surfaces only exist on block faces).
    pub fn face(&self) -> Face {
        let normal = self.normal_axis();
        let side = if self.const_index() == 0 {
            Side::Lower
        } else {
            Side::Upper
        };
        Face { normal, side }
    }

    /// In-plane range along the face's dir1.
    pub fn range_dir1(&self) -> [usize; 2] {
        self.range(self.face().in_plane().0)
    }

    /// In-plane range along the face's dir2.
    pub fn range_dir2(&self) -> [usize; 2] {
        self.range(self.face().in_plane().1)
    }

    /// Number of faces (cell faces) covered by the surface.
    pub fn num_faces(&self) -> usize {
        let (d1, d2) = self.face().in_plane();
        let [a0, a1] = self.range(d1);
        let [b0, b1] = self.range(d2);
        (a1 - a0) * (b1 - b0)
    }

    /// Partition this surface for a block cut along `axis` at `index`.
    ///
    /// Upper-side results are re-indexed into the upper block's index space
    /// (split-axis range shifted down by `index`).
    pub(crate) fn split(&self, axis: Axis, index: usize) -> SurfaceSplit {
        let [lo, hi] = self.range(axis);
        if hi <= index {
            SurfaceSplit::Lower(self.clone())
        } else if lo >= index {
            let mut upper = self.clone();
            upper.ranges[axis.index()] = [lo - index, hi - index];
            SurfaceSplit::Upper(upper)
        } else {
            // Only possible for faces whose normal is perpendicular to `axis`.
            let mut lower = self.clone();
            lower.ranges[axis.index()] = [lo, index];
            let mut upper = self.clone();
            upper.ranges[axis.index()] = [0, hi - index];
            SurfaceSplit::Both { lower, upper }
        }
    }

    /// Clip this surface in two at `index` along `axis`, staying in the
    /// owning block's index space (used when mirroring a partner's split).
    pub(crate) fn clip(&self, axis: Axis, index: usize) -> Result<(Self, Self), MeshDecompError> {
        let [lo, hi] = self.range(axis);
        if index <= lo || index >= hi {
            return Err(MeshDecompError::InvalidSplitIndex {
                axis,
                index,
                cells: hi - lo,
            });
        }
        let mut lower = self.clone();
        lower.ranges[axis.index()] = [lo, index];
        let mut upper = self.clone();
        upper.ranges[axis.index()] = [index, hi];
        Ok((lower, upper))
    }

    /// Whether a cut along `axis` through this surface lands reversed on
    /// its matched partner, given the pair's orientation with this surface
    /// as the first patch.
    ///
    /// `axis` must be one of this surface's in-plane directions; the caller
    /// translates the split index on the partner with the returned flag.
    pub fn split_direction_is_reversed(&self, axis: Axis, orientation: Orientation) -> bool {
        let (d1, d2) = self.face().in_plane();
        if axis == d1 {
            orientation.image_of(InPlaneDir::Dir1).1
        } else if axis == d2 {
            orientation.image_of(InPlaneDir::Dir2).1
        } else {
            false
        }
    }
}

impl fmt::Display for BoundarySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: i[{}, {}] j[{}, {}] k[{}, {}] tag {}",
            self.bc_type,
            self.i_min(),
            self.i_max(),
            self.j_min(),
            self.j_max(),
            self.k_min(),
            self.k_max(),
            self.tag
        )
    }
}
