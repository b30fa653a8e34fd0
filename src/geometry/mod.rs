//! Rectilinear structured-block geometry.
//!
//! The decomposition core only ever asks a block three things: how many cells
//! it has along each axis, how many in total, and for the sub-blocks on
//! either side of a cut. Patch matching additionally needs physical node
//! coordinates at surface corners. [`StructuredBlock`] is the in-crate
//! realization of that contract: a product grid of per-axis node coordinate
//! arrays, so splits are cheap and split halves keep their physical placement
//! (adjacent halves share the seam plane exactly).

use crate::error::MeshDecompError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three index directions of a structured block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
    K,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::I, Axis::J, Axis::K];

    /// Position of this axis in `[i, j, k]`-ordered arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::I => 0,
            Axis::J => 1,
            Axis::K => 2,
        }
    }

    /// The other two axes, in cyclic order (i -> (j,k), j -> (k,i), k -> (i,j)).
    ///
    /// This is also the (dir1, dir2) in-plane convention for a face whose
    /// normal is `self`; orientation codes depend on it staying fixed.
    #[inline]
    pub fn orthogonal(self) -> (Axis, Axis) {
        match self {
            Axis::I => (Axis::J, Axis::K),
            Axis::J => (Axis::K, Axis::I),
            Axis::K => (Axis::I, Axis::J),
        }
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<Axis> {
        match idx {
            0 => Some(Axis::I),
            1 => Some(Axis::J),
            2 => Some(Axis::K),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::I => write!(f, "i"),
            Axis::J => write!(f, "j"),
            Axis::K => write!(f, "k"),
        }
    }
}

impl FromStr for Axis {
    type Err = MeshDecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "i" | "I" => Ok(Axis::I),
            "j" | "J" => Ok(Axis::J),
            "k" | "K" => Ok(Axis::K),
            other => Err(MeshDecompError::InvalidSurface(format!(
                "unknown axis `{other}`"
            ))),
        }
    }
}

/// A physical point; plain array so it casts straight into wire records.
pub type Point3 = [f64; 3];

/// Squared distance between two points.
#[inline]
pub fn dist_sq(a: Point3, b: Point3) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
}

/// A logically rectangular block on a rectilinear product grid.
///
/// Node coordinates are stored per axis; the node at index `(i, j, k)` sits
/// at `(x[i], y[j], z[k])`. Cell counts are node counts minus one.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredBlock {
    coords: [Vec<f64>; 3],
}

impl StructuredBlock {
    /// Build a block from per-axis node coordinates.
    ///
    /// Each axis needs at least two nodes (one cell).
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self, MeshDecompError> {
        for (axis, c) in Axis::ALL.iter().zip([&x, &y, &z]) {
            if c.len() < 2 {
                return Err(MeshDecompError::InvalidBlock {
                    axis: *axis,
                    nodes: c.len(),
                });
            }
        }
        Ok(Self { coords: [x, y, z] })
    }

    /// Unit-spaced block with the given cell counts, origin at zero.
    pub fn unit(cells: [usize; 3]) -> Self {
        Self::unit_at(cells, [0.0; 3])
    }

    /// Unit-spaced block with the given cell counts and origin.
    pub fn unit_at(cells: [usize; 3], origin: Point3) -> Self {
        let coords = [0, 1, 2].map(|d| {
            (0..=cells[d])
                .map(|n| origin[d] + n as f64)
                .collect::<Vec<_>>()
        });
        Self { coords }
    }

    /// Number of cells along one axis.
    #[inline]
    pub fn num_cells(&self, axis: Axis) -> usize {
        self.coords[axis.index()].len() - 1
    }

    /// Number of nodes along one axis.
    #[inline]
    pub fn num_nodes(&self, axis: Axis) -> usize {
        self.coords[axis.index()].len()
    }

    /// Total cell count.
    pub fn num_cells_total(&self) -> usize {
        Axis::ALL.iter().map(|&d| self.num_cells(d)).product()
    }

    /// Cell counts as `[i, j, k]`.
    pub fn cell_counts(&self) -> [usize; 3] {
        [
            self.num_cells(Axis::I),
            self.num_cells(Axis::J),
            self.num_cells(Axis::K),
        ]
    }

    /// Physical coordinates of the node at `(i, j, k)`.
    #[inline]
    pub fn node(&self, i: usize, j: usize, k: usize) -> Point3 {
        [self.coords[0][i], self.coords[1][j], self.coords[2][k]]
    }

    /// Per-axis node coordinate slice (used when packing geometry for transfer).
    pub fn axis_coords(&self, axis: Axis) -> &[f64] {
        &self.coords[axis.index()]
    }

    /// Cut the block along `axis` at face index `index`.
    ///
    /// The lower block keeps cells `0..index`, the upper `index..cells`.
    /// Both halves retain their physical coordinates, so the new internal
    /// faces coincide exactly.
    pub fn split_at(
        &self,
        axis: Axis,
        index: usize,
    ) -> Result<(StructuredBlock, StructuredBlock), MeshDecompError> {
        let cells = self.num_cells(axis);
        if index == 0 || index >= cells {
            return Err(MeshDecompError::InvalidSplitIndex { axis, index, cells });
        }
        let d = axis.index();
        let mut lower = self.clone();
        let mut upper = self.clone();
        lower.coords[d] = self.coords[d][..=index].to_vec();
        upper.coords[d] = self.coords[d][index..].to_vec();
        Ok((lower, upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_preserves_cells_and_seam() {
        let blk = StructuredBlock::unit([10, 4, 6]);
        let (lo, up) = blk.split_at(Axis::I, 3).unwrap();
        assert_eq!(lo.num_cells(Axis::I), 3);
        assert_eq!(up.num_cells(Axis::I), 7);
        assert_eq!(
            lo.num_cells_total() + up.num_cells_total(),
            blk.num_cells_total()
        );
        // Seam plane is shared.
        assert_eq!(lo.node(3, 0, 0), up.node(0, 0, 0));
    }

    #[test]
    fn split_rejects_degenerate_halves() {
        let blk = StructuredBlock::unit([4, 4, 4]);
        assert!(blk.split_at(Axis::J, 0).is_err());
        assert!(blk.split_at(Axis::J, 4).is_err());
    }

    #[test]
    fn new_rejects_an_axis_with_fewer_than_two_nodes() {
        let err = StructuredBlock::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            MeshDecompError::InvalidBlock {
                axis: Axis::J,
                nodes: 1
            }
        );
    }

    #[test]
    fn axis_string_round_trip() {
        for d in Axis::ALL {
            assert_eq!(d.to_string().parse::<Axis>().unwrap(), d);
        }
    }
}
