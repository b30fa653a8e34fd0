//! Split/join behavior of block boundary conditions, including the
//! mirrored dependent split on a connected neighbor.

use mesh_decomp::bc::{BoundaryConditions, BoundarySurface};
use mesh_decomp::geometry::{Axis, StructuredBlock};

fn surface_key(s: &BoundarySurface) -> (String, [usize; 6], i32) {
    (
        s.bc_type().to_string(),
        [
            s.i_min(),
            s.i_max(),
            s.j_min(),
            s.j_max(),
            s.k_min(),
            s.k_max(),
        ],
        s.tag(),
    )
}

fn sorted_keys(bc: &BoundaryConditions) -> Vec<(String, [usize; 6], i32)> {
    let mut keys: Vec<_> = bc.surfaces().map(surface_key).collect();
    keys.sort();
    keys
}

#[test]
fn split_then_join_restores_the_original_surfaces() {
    let cells = [4, 8, 4];
    let original = BoundaryConditions::whole_block("slipWall", cells);
    let geom = StructuredBlock::unit(cells);

    let mut lower = original.clone();
    let (upper_bc, spanning) = lower.split(Axis::J, 3, 10).unwrap();
    assert!(spanning.is_empty(), "walls never force dependent splits");

    let (lower_geom, upper_geom) = geom.split_at(Axis::J, 3).unwrap();
    lower.validate(&lower_geom).unwrap();
    upper_bc.validate(&upper_geom).unwrap();

    // Exactly one synthetic connection on each side of the seam.
    assert_eq!(
        lower.surfaces().filter(|s| s.is_connection()).count(),
        1
    );
    assert_eq!(
        upper_bc.surfaces().filter(|s| s.is_connection()).count(),
        1
    );

    lower.join(&upper_bc, Axis::J).unwrap();
    assert_eq!(sorted_keys(&lower), sorted_keys(&original));
    lower.validate(&geom).unwrap();
}

#[test]
fn join_rejects_blocks_without_a_seam() {
    let mut a = BoundaryConditions::whole_block("slipWall", [4, 4, 4]);
    let b = BoundaryConditions::whole_block("slipWall", [4, 4, 4]);
    assert!(a.join(&b, Axis::I).is_err());
}

// Two blocks share an i-face connection (tag 5). Splitting the right
// block along j at 4 must clip the left block's matching surface at the
// mirrored index.
#[test]
fn dependent_split_mirrors_the_cut_on_the_partner() {
    let cells = [4, 8, 4];
    let left_geom = StructuredBlock::unit(cells);
    let right_geom = StructuredBlock::unit_at(cells, [4.0, 0.0, 0.0]);

    let mk = |r, bc: &str, tag| BoundarySurface::new(bc, r, tag).unwrap();
    let mut left = BoundaryConditions::new(vec![
        mk([[0, 0], [0, 8], [0, 4]], "slipWall", 0),
        mk([[4, 4], [0, 8], [0, 4]], "interblock", 5),
        mk([[0, 4], [0, 0], [0, 4]], "slipWall", 0),
        mk([[0, 4], [8, 8], [0, 4]], "slipWall", 0),
        mk([[0, 4], [0, 8], [0, 0]], "slipWall", 0),
        mk([[0, 4], [0, 8], [4, 4]], "slipWall", 0),
    ]);
    let mut right = BoundaryConditions::new(vec![
        mk([[0, 0], [0, 8], [0, 4]], "interblock", 5),
        mk([[4, 4], [0, 8], [0, 4]], "slipWall", 0),
        mk([[0, 4], [0, 0], [0, 4]], "slipWall", 0),
        mk([[0, 4], [8, 8], [0, 4]], "slipWall", 0),
        mk([[0, 4], [0, 8], [0, 0]], "slipWall", 0),
        mk([[0, 4], [0, 8], [4, 4]], "slipWall", 0),
    ]);

    let (upper_bc, spanning) = right.split(Axis::J, 4, 6).unwrap();
    assert_eq!(spanning.len(), 1);
    assert_eq!(spanning[0].tag(), 5);

    left.dependent_split(&spanning[0], &right_geom, &left_geom, 0, Axis::J, 4)
        .unwrap();

    let mut tiles: Vec<_> = left
        .surfaces()
        .filter(|s| s.is_connection())
        .map(|s| (s.j_min(), s.j_max()))
        .collect();
    tiles.sort_unstable();
    assert_eq!(tiles, vec![(0, 4), (4, 8)]);
    left.validate(&left_geom).unwrap();

    // The split halves keep one clipped connection each toward the left
    // block plus the fresh seam between themselves.
    let (rg_lower, rg_upper) = right_geom.split_at(Axis::J, 4).unwrap();
    right.validate(&rg_lower).unwrap();
    upper_bc.validate(&rg_upper).unwrap();
    assert_eq!(right.surfaces().filter(|s| s.tag() == 5).count(), 1);
    assert_eq!(upper_bc.surfaces().filter(|s| s.tag() == 5).count(), 1);
    assert_eq!(right.surfaces().filter(|s| s.tag() == 6).count(), 1);
    assert_eq!(upper_bc.surfaces().filter(|s| s.tag() == 6).count(), 1);
}
