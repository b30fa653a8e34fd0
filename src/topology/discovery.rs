//! Interblock discovery: pair up connection patches mesh-wide and compute
//! their relative orientation.

use crate::bc::{BoundaryConditions, Patch};
use crate::decomp::Decomposition;
use crate::error::MeshDecompError;
use crate::geometry::{dist_sq, StructuredBlock};
use crate::topology::interblock::Interblock;
use crate::topology::orientation::Orientation;
use std::collections::BTreeMap;

/// Corner-coincidence tolerance for point matching.
const MATCH_TOL: f64 = 1e-8;

/// Test whether two patches are point-matched and, if so, return the unique
/// orientation mapping `a`'s local axes onto `b`'s.
///
/// Corners are compared under each of the 8 square symmetries in code order;
/// the first (and for valid meshes, only) symmetry whose image reproduces
/// `b`'s corner order within tolerance wins.
pub fn patch_match(a: &Patch, b: &Patch) -> Option<Orientation> {
    let ac = a.corners();
    let bc = b.corners();
    // Corner i of a patch sits at normalized (u, v) = UV[i].
    const UV: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];

    let corner_at = |u: f64, v: f64| -> usize {
        (if u > 0.5 { 1 } else { 0 }) + (if v > 0.5 { 2 } else { 0 })
    };

    'codes: for o in Orientation::ALL {
        for (i, &(u, v)) in UV.iter().enumerate() {
            let (u2, v2) = o.apply(u, v);
            let j = corner_at(u2, v2);
            if dist_sq(ac[i], bc[j]) > MATCH_TOL * MATCH_TOL {
                continue 'codes;
            }
        }
        return Some(o);
    }
    None
}

/// Build the global connection list: every point-matched pair of patches,
/// wrapped with the current decomposition's rank/local-slot assignment.
///
/// Patches are grouped by tag; within a group, pairing is by corner
/// coincidence, so a tag shared by two pairs after a dependent split still
/// resolves unambiguously. Tagless adjacency (all tags equal) degenerates to
/// pure geometric matching. An unmatched patch is a fatal topology error.
///
/// The list must be recomputed whenever the decomposition changes: the
/// rank/local-slot fields depend on the current assignment, and splits
/// introduce new pairs.
pub fn interblock_connections(
    bcs: &[BoundaryConditions],
    grid: &[StructuredBlock],
    decomp: &Decomposition,
) -> Result<Vec<Interblock>, MeshDecompError> {
    let mut by_tag: BTreeMap<i32, Vec<Patch>> = BTreeMap::new();
    for (block, bc) in bcs.iter().enumerate() {
        for (idx, surf) in bc.surfaces().enumerate() {
            if !surf.is_connection() {
                continue;
            }
            let border = bc.borders_surface(idx);
            by_tag.entry(surf.tag()).or_default().push(Patch::new(
                surf,
                &grid[block],
                block,
                border,
                decomp.rank(block),
                decomp.local_position(block),
            ));
        }
    }

    let mut connections = Vec::new();
    for (tag, mut patches) in by_tag {
        while let Some(first) = patches.pop() {
            let found = patches
                .iter()
                .enumerate()
                .find_map(|(i, p)| patch_match(&first, p).map(|o| (i, o)));
            let Some((i, orientation)) = found else {
                return Err(MeshDecompError::UnmatchedPatch {
                    block: first.block(),
                    tag,
                });
            };
            let second = patches.remove(i);
            connections.push(Interblock::new(&first, &second, orientation));
        }
    }
    Ok(connections)
}
