//! The ordered collection of boundary surfaces for one block.
//!
//! Surfaces are grouped by face family (i-, j-, k-faces) with per-family
//! counts. The collection owns the split/join logic that keeps boundary
//! topology consistent while the load balancer cuts blocks apart, and the
//! explicit byte packing used when a block is reassigned to another rank.

use crate::bc::patch::Patch;
use crate::bc::surface::{BoundarySurface, SurfaceSplit};
use crate::error::MeshDecompError;
use crate::geometry::{Axis, StructuredBlock};
use crate::topology::discovery::patch_match;
use crate::topology::orientation::InPlaneDir;
use bytes::{Buf, BufMut};
use std::fmt;

/// Boundary conditions for one block: surfaces grouped i-family first, then
/// j, then k, with counts summing to `num_surfaces()`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryConditions {
    surfs: Vec<BoundarySurface>,
    num_surf_i: usize,
    num_surf_j: usize,
    num_surf_k: usize,
}

impl BoundaryConditions {
    /// Build from a surface list; surfaces are regrouped by face family.
    pub fn new(surfs: Vec<BoundarySurface>) -> Self {
        let mut grouped = surfs;
        grouped.sort_by_key(|s| s.normal_axis().index());
        let count =
            |axis: Axis| grouped.iter().filter(|s| s.normal_axis() == axis).count();
        let (num_surf_i, num_surf_j, num_surf_k) =
            (count(Axis::I), count(Axis::J), count(Axis::K));
        Self {
            surfs: grouped,
            num_surf_i,
            num_surf_j,
            num_surf_k,
        }
    }

    /// Whole-face boundary conditions for a block with the given cell counts,
    /// all six faces a single surface of `bc_type` with tag 0.
    pub fn whole_block(bc_type: &str, cells: [usize; 3]) -> Self {
        let [ni, nj, nk] = cells;
        let mk = |ranges| BoundarySurface::new(bc_type, ranges, 0).expect("whole-face surface");
        Self::new(vec![
            mk([[0, 0], [0, nj], [0, nk]]),
            mk([[ni, ni], [0, nj], [0, nk]]),
            mk([[0, ni], [0, 0], [0, nk]]),
            mk([[0, ni], [nj, nj], [0, nk]]),
            mk([[0, ni], [0, nj], [0, 0]]),
            mk([[0, ni], [0, nj], [nk, nk]]),
        ])
    }

    pub fn num_surfaces(&self) -> usize {
        self.surfs.len()
    }
    pub fn num_surf_i(&self) -> usize {
        self.num_surf_i
    }
    pub fn num_surf_j(&self) -> usize {
        self.num_surf_j
    }
    pub fn num_surf_k(&self) -> usize {
        self.num_surf_k
    }

    pub fn surface(&self, idx: usize) -> &BoundarySurface {
        &self.surfs[idx]
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &BoundarySurface> {
        self.surfs.iter()
    }

    /// Block extent along `axis`, inferred as the largest surface index.
    pub fn block_dim(&self, axis: Axis) -> usize {
        self.surfs
            .iter()
            .map(|s| s.range(axis)[1])
            .max()
            .unwrap_or(0)
    }

    /// Edge-border flags for surface `idx`, in (dir1 start, dir1 end,
    /// dir2 start, dir2 end) order.
    ///
    /// An edge borders another patch when a different connection surface on
    /// the same block face abuts it there; such an edge is an internal
    /// partition seam rather than a true mesh boundary.
    pub fn borders_surface(&self, idx: usize) -> [bool; 4] {
        let s = &self.surfs[idx];
        let face = s.face();
        let (d1, d2) = face.in_plane();
        let [a0, a1] = s.range(d1);
        let [b0, b1] = s.range(d2);

        let overlaps = |x: [usize; 2], y: [usize; 2]| x[1].min(y[1]) > x[0].max(y[0]);

        let mut border = [false; 4];
        for (o_idx, o) in self.surfs.iter().enumerate() {
            if o_idx == idx
                || !o.is_connection()
                || o.normal_axis() != face.normal
                || o.const_index() != s.const_index()
            {
                continue;
            }
            let o1 = o.range(d1);
            let o2 = o.range(d2);
            if o1[1] == a0 && overlaps(o2, [b0, b1]) {
                border[0] = true;
            }
            if o1[0] == a1 && overlaps(o2, [b0, b1]) {
                border[1] = true;
            }
            if o2[1] == b0 && overlaps(o1, [a0, a1]) {
                border[2] = true;
            }
            if o2[0] == b1 && overlaps(o1, [a0, a1]) {
                border[3] = true;
            }
        }
        border
    }

    /// Partition for a block cut along `axis` at cell/face index `index`.
    ///
    /// `self` becomes the lower block's boundary conditions; the upper
    /// block's are returned, along with the pre-split connection surfaces
    /// that spanned the cut (their partners need a mirroring
    /// [`dependent_split`](Self::dependent_split)). A synthetic
    /// `"interblock"` pair tagged `new_tag` is added on the new internal
    /// face so ghost data can cross the split.
    pub fn split(
        &mut self,
        axis: Axis,
        index: usize,
        new_tag: i32,
    ) -> Result<(BoundaryConditions, Vec<BoundarySurface>), MeshDecompError> {
        let dim = self.block_dim(axis);
        if index == 0 || index >= dim {
            return Err(MeshDecompError::InvalidSplitIndex {
                axis,
                index,
                cells: dim,
            });
        }

        let mut lower = Vec::with_capacity(self.surfs.len() + 1);
        let mut upper = Vec::with_capacity(self.surfs.len() + 1);
        let mut alt = Vec::new();
        for s in &self.surfs {
            match s.split(axis, index) {
                SurfaceSplit::Lower(l) => lower.push(l),
                SurfaceSplit::Upper(u) => upper.push(u),
                SurfaceSplit::Both { lower: l, upper: u } => {
                    if s.is_connection() {
                        alt.push(s.clone());
                    }
                    lower.push(l);
                    upper.push(u);
                }
            }
        }

        // Synthesize the connection pair across the new internal face.
        let (d1, d2) = axis.orthogonal();
        let (e1, e2) = (self.block_dim(d1), self.block_dim(d2));
        let seam = |c: usize| {
            let mut ranges = [[0usize; 2]; 3];
            ranges[axis.index()] = [c, c];
            ranges[d1.index()] = [0, e1];
            ranges[d2.index()] = [0, e2];
            BoundarySurface::new(super::INTERBLOCK, ranges, new_tag)
        };
        lower.push(seam(index)?);
        upper.push(seam(0)?);

        *self = BoundaryConditions::new(lower);
        Ok((BoundaryConditions::new(upper), alt))
    }

    /// Mirror a partner block's split onto this block's matching surface.
    ///
    /// `alt_surf` is the connection surface of the block that was cut
    /// (pre-split ranges), `split_geom` that block's pre-split geometry and
    /// `self_geom` this block's geometry; the partner-side cut ran along
    /// `axis` at `index`. The matching surface here is clipped in two at the
    /// translated index, honoring a reversed index correspondence across the
    /// match. `partner_block` is this block's id, used for error reporting.
    pub fn dependent_split(
        &mut self,
        alt_surf: &BoundarySurface,
        split_geom: &StructuredBlock,
        self_geom: &StructuredBlock,
        partner_block: usize,
        axis: Axis,
        index: usize,
    ) -> Result<(), MeshDecompError> {
        let a = Patch::new(alt_surf, split_geom, 0, [false; 4], 0, 0);

        // Find our side of the match: same tag, corners coincide.
        let mut found = None;
        for (idx, s) in self.surfs.iter().enumerate() {
            if !s.is_connection() || s.tag() != alt_surf.tag() {
                continue;
            }
            let b = Patch::new(s, self_geom, partner_block, [false; 4], 0, 0);
            if let Some(orientation) = patch_match(&a, &b) {
                found = Some((idx, orientation));
                break;
            }
        }
        let Some((idx, orientation)) = found else {
            return Err(MeshDecompError::UnmatchedPatch {
                block: partner_block,
                tag: alt_surf.tag(),
            });
        };

        // The cut runs along one of alt_surf's in-plane directions; find its
        // image on our side and translate the split index, reversing the
        // local coordinate when the match runs backwards.
        let (alt_d1, _) = alt_surf.face().in_plane();
        let cut_dir = if axis == alt_d1 {
            InPlaneDir::Dir1
        } else {
            InPlaneDir::Dir2
        };
        let (target_dir, _) = orientation.image_of(cut_dir);
        let reversed = alt_surf.split_direction_is_reversed(axis, orientation);
        let s = &self.surfs[idx];
        let (s_d1, s_d2) = s.face().in_plane();
        let target_axis = match target_dir {
            InPlaneDir::Dir1 => s_d1,
            InPlaneDir::Dir2 => s_d2,
        };
        let t = index - alt_surf.range(axis)[0];
        let [s0, s1] = s.range(target_axis);
        let split_index = if reversed { s1 - t } else { s0 + t };

        let (lower, upper) = s.clip(target_axis, split_index)?;
        let mut surfs = self.surfs.clone();
        surfs[idx] = lower;
        surfs.push(upper);
        *self = BoundaryConditions::new(surfs);
        Ok(())
    }

    /// Undo a prior [`split`](Self::split): re-absorb `upper` (the boundary
    /// conditions of the upper half, cut along `axis`) into `self`.
    ///
    /// The synthetic connection pair introduced by the split is removed and
    /// clipped surface halves are re-merged. Returns the merged surfaces.
    /// Joining blocks not produced by a matching prior split fails.
    pub fn join(
        &mut self,
        upper: &BoundaryConditions,
        axis: Axis,
    ) -> Result<Vec<BoundarySurface>, MeshDecompError> {
        let index = self.block_dim(axis);

        // Locate the seam pair: our axis-max connection face and the upper
        // block's axis-min face, sharing a tag.
        let my_seam = self
            .surfs
            .iter()
            .position(|s| {
                s.is_connection() && s.normal_axis() == axis && s.const_index() == index
            })
            .ok_or_else(|| MeshDecompError::JoinMismatch {
                axis,
                reason: "lower block has no connection surface on its upper face".into(),
            })?;
        let my_tag = self.surfs[my_seam].tag();
        let their_seam_exists = upper.surfs.iter().any(|s| {
            s.is_connection()
                && s.normal_axis() == axis
                && s.const_index() == 0
                && s.tag() == my_tag
        });
        if !their_seam_exists {
            return Err(MeshDecompError::JoinMismatch {
                axis,
                reason: format!("upper block has no matching seam with tag {my_tag}"),
            });
        }

        let mut merged_out = Vec::new();
        let mut result: Vec<BoundarySurface> = self
            .surfs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != my_seam)
            .map(|(_, s)| s.clone())
            .collect();

        for u in &upper.surfs {
            if u.is_connection()
                && u.normal_axis() == axis
                && u.const_index() == 0
                && u.tag() == my_tag
            {
                continue; // the seam being dissolved
            }
            // Shift back into the joined block's index space.
            let [lo, hi] = u.range(axis);
            let mut ranges = [u.range(Axis::I), u.range(Axis::J), u.range(Axis::K)];
            ranges[axis.index()] = [lo + index, hi + index];
            let shifted = BoundarySurface::new(u.bc_type(), ranges, u.tag())?;

            // Far-face surfaces (normal along the split axis) were never
            // clipped; they shift back as-is.
            if shifted.normal_axis() == axis {
                result.push(shifted);
                continue;
            }

            // Re-merge with the lower-side half it was clipped from.
            let partner = result.iter_mut().find(|l| {
                l.bc_type() == shifted.bc_type()
                    && l.tag() == shifted.tag()
                    && l.normal_axis() == shifted.normal_axis()
                    && l.const_index() == shifted.const_index()
                    && l.range(axis)[1] == shifted.range(axis)[0]
                    && Axis::ALL
                        .into_iter()
                        .find(|&d| d != axis && d != shifted.normal_axis())
                        .is_some_and(|d| l.range(d) == shifted.range(d))
            });
            match partner {
                Some(l) => {
                    let mut ranges =
                        [l.range(Axis::I), l.range(Axis::J), l.range(Axis::K)];
                    ranges[axis.index()] = [l.range(axis)[0], shifted.range(axis)[1]];
                    *l = BoundarySurface::new(l.bc_type(), ranges, l.tag())?;
                    merged_out.push(l.clone());
                }
                None => result.push(shifted),
            }
        }

        *self = BoundaryConditions::new(result);
        Ok(merged_out)
    }

    /// Explicit byte packing: surface count, per-family counts, then each
    /// surface as a length-prefixed type string, six indices, and the tag.
    /// Used only when a block's topology travels with a reassignment.
    pub fn pack(&self, buf: &mut impl BufMut) {
        buf.put_u32_le(self.surfs.len() as u32);
        buf.put_u32_le(self.num_surf_i as u32);
        buf.put_u32_le(self.num_surf_j as u32);
        buf.put_u32_le(self.num_surf_k as u32);
        for s in &self.surfs {
            let name = s.bc_type().as_bytes();
            buf.put_u32_le(name.len() as u32);
            buf.put_slice(name);
            for d in Axis::ALL {
                let [lo, hi] = s.range(d);
                buf.put_i32_le(lo as i32);
                buf.put_i32_le(hi as i32);
            }
            buf.put_i32_le(s.tag());
        }
    }

    /// Inverse of [`pack`](Self::pack).
    pub fn unpack(buf: &mut impl Buf) -> Result<Self, MeshDecompError> {
        fn need(got: usize, n: usize) -> Result<(), MeshDecompError> {
            if got < n {
                Err(MeshDecompError::Truncated { expected: n, got })
            } else {
                Ok(())
            }
        }

        need(buf.remaining(), 16)?;
        let count = buf.get_u32_le() as usize;
        let _ni = buf.get_u32_le();
        let _nj = buf.get_u32_le();
        let _nk = buf.get_u32_le();

        let mut surfs = Vec::with_capacity(count);
        for _ in 0..count {
            need(buf.remaining(), 4)?;
            let name_len = buf.get_u32_le() as usize;
            need(buf.remaining(), name_len + 7 * 4)?;
            let mut name = vec![0u8; name_len];
            buf.copy_to_slice(&mut name);
            let name = String::from_utf8(name)
                .map_err(|e| MeshDecompError::InvalidSurface(e.to_string()))?;
            let mut ranges = [[0usize; 2]; 3];
            for r in &mut ranges {
                r[0] = buf.get_i32_le() as usize;
                r[1] = buf.get_i32_le() as usize;
            }
            let tag = buf.get_i32_le();
            surfs.push(BoundarySurface::new(name, ranges, tag)?);
        }
        Ok(BoundaryConditions::new(surfs))
    }

    /// Check the tiling invariant against a block's cell counts: each face
    /// family's surfaces exactly cover the corresponding face pair with no
    /// gaps or overlaps.
    pub fn validate(&self, geom: &StructuredBlock) -> Result<(), MeshDecompError> {
        for normal in Axis::ALL {
            let (d1, d2) = normal.orthogonal();
            let (e1, e2) = (geom.num_cells(d1), geom.num_cells(d2));
            for c in [0, geom.num_cells(normal)] {
                let on_face: Vec<&BoundarySurface> = self
                    .surfs
                    .iter()
                    .filter(|s| s.normal_axis() == normal && s.const_index() == c)
                    .collect();
                let covered: usize = on_face.iter().map(|s| s.num_faces()).sum();
                if covered != e1 * e2 {
                    return Err(MeshDecompError::InvalidSurface(format!(
                        "face {normal}={c} covers {covered} of {} faces",
                        e1 * e2
                    )));
                }
                for (i, s) in on_face.iter().enumerate() {
                    for o in &on_face[i + 1..] {
                        let olap = |x: [usize; 2], y: [usize; 2]| x[1].min(y[1]) > x[0].max(y[0]);
                        if olap(s.range(d1), o.range(d1)) && olap(s.range(d2), o.range(d2)) {
                            return Err(MeshDecompError::InvalidSurface(format!(
                                "surfaces overlap on face {normal}={c}: {s} / {o}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for BoundaryConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} surfaces ({} i, {} j, {} k)",
            self.num_surfaces(),
            self.num_surf_i,
            self.num_surf_j,
            self.num_surf_k
        )?;
        for s in &self.surfs {
            writeln!(f, "  {s}")?;
        }
        Ok(())
    }
}
