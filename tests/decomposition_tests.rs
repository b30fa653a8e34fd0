//! End-to-end decomposition scenarios: manual assignment, cubic load
//! balancing, and connectivity discovery on the balanced mesh.

use mesh_decomp::bc::BoundaryConditions;
use mesh_decomp::config::{DecompMethod, RunConfig};
use mesh_decomp::decomp::{decompose, LoadStats};
use mesh_decomp::geometry::{Axis, StructuredBlock};
use mesh_decomp::topology::{interblock_connections, Orientation};

fn whole_blocks(sizes: &[[usize; 3]]) -> (Vec<StructuredBlock>, Vec<BoundaryConditions>) {
    let grid = sizes.iter().map(|&c| StructuredBlock::unit(c)).collect();
    let bcs = sizes
        .iter()
        .map(|&c| BoundaryConditions::whole_block("slipWall", c))
        .collect();
    (grid, bcs)
}

#[test]
fn manual_two_blocks_two_ranks() {
    // 100-cell and 50-cell blocks on two ranks, in input order.
    let (mut grid, mut bcs) = whole_blocks(&[[10, 10, 1], [5, 10, 1]]);
    let config = RunConfig::new(2, DecompMethod::Manual);
    let d = decompose(&mut grid, &mut bcs, &config).unwrap();

    assert_eq!(d.rank(0), 0);
    assert_eq!(d.rank(1), 1);
    assert_eq!(d.proc_load(&grid, 0), 100);
    assert_eq!(d.proc_load(&grid, 1), 50);
    assert_eq!(d.num_splits(), 0);
    assert_eq!(grid.len(), 2);
}

#[test]
fn cubic_balances_a_cube_across_four_ranks() {
    let (mut grid, mut bcs) = whole_blocks(&[[10, 10, 10]]);
    let config = RunConfig::new(4, DecompMethod::Cubic);
    let d = decompose(&mut grid, &mut bcs, &config).unwrap();

    assert_eq!(grid.len(), 4);
    assert_eq!(bcs.len(), 4);
    assert_eq!(d.num_splits(), 3);
    for p in 0..4 {
        assert_eq!(d.proc_load(&grid, p), 250);
    }
    let stats = LoadStats::new(&d, &grid);
    assert!((stats.imbalance() - 1.0).abs() < 1e-12);

    // Every block's boundary must still tile its faces.
    for (g, bc) in grid.iter().zip(&bcs) {
        bc.validate(g).unwrap();
    }
}

#[test]
fn cubic_split_history_reconstructs_the_cuts() {
    let (mut grid, mut bcs) = whole_blocks(&[[10, 10, 10]]);
    let config = RunConfig::new(4, DecompMethod::Cubic);
    let d = decompose(&mut grid, &mut bcs, &config).unwrap();

    let history = d.split_history();
    assert_eq!(history[0].axis, Axis::K);
    assert_eq!(history[0].index, 5);
    for s in &history[1..] {
        assert_eq!(s.axis, Axis::J);
        assert_eq!(s.index, 5);
    }
    // Upper ids were appended past the pre-split block count.
    for (n, s) in history.iter().enumerate() {
        assert_eq!(s.upper, 1 + n);
        assert_eq!(d.parent_block(s.upper), 0);
    }
}

#[test]
fn discovery_matches_every_seam_the_balancer_introduced() {
    let (mut grid, mut bcs) = whole_blocks(&[[10, 10, 10]]);
    let config = RunConfig::new(4, DecompMethod::Cubic);
    let d = decompose(&mut grid, &mut bcs, &config).unwrap();

    let conns = interblock_connections(&bcs, &grid, &d).unwrap();
    assert_eq!(conns.len(), 4);
    for c in &conns {
        // Axis-aligned splits of one rectilinear block always line up.
        assert_eq!(c.orientation(), Orientation::Identity);
        assert_eq!(c.dir1_len_first(), c.dir1_len_second());
        assert_eq!(c.dir2_len_first(), c.dir2_len_second());
        assert_ne!(c.block_first(), c.block_second());
        assert_eq!(d.rank(c.block_first()), c.rank_first());
        assert_eq!(d.rank(c.block_second()), c.rank_second());
    }
}

#[test]
fn local_slots_stay_dense_through_balancing() {
    let (mut grid, mut bcs) = whole_blocks(&[[8, 8, 8], [4, 4, 4]]);
    let config = RunConfig::new(3, DecompMethod::Cubic);
    let d = decompose(&mut grid, &mut bcs, &config).unwrap();

    for p in 0..3 {
        let mut slots: Vec<_> = (0..d.size())
            .filter(|&b| d.rank(b) == p)
            .map(|b| d.local_position(b))
            .collect();
        slots.sort_unstable();
        assert_eq!(slots, (0..slots.len()).collect::<Vec<_>>());
    }
}
