//! Two-rank exchange of the full decomposition payload over the
//! in-process communicator.

use mesh_decomp::bc::BoundaryConditions;
use mesh_decomp::decomp::Decomposition;
use mesh_decomp::geometry::StructuredBlock;
use mesh_decomp::topology::interblock_connections;
use mesh_decomp::transport::{
    broadcast_connections, distribute_blocks, gather_blocks, scatter_num_blocks, LocalComm,
    ProcBlock,
};
use serial_test::serial;

fn two_block_mesh() -> (Vec<StructuredBlock>, Vec<BoundaryConditions>, Decomposition) {
    use mesh_decomp::bc::BoundarySurface;
    let mk = |r, bc: &str, tag| BoundarySurface::new(bc, r, tag).unwrap();
    let grid = vec![
        StructuredBlock::unit([4, 4, 4]),
        StructuredBlock::unit_at([4, 4, 4], [4.0, 0.0, 0.0]),
    ];
    let faces = |conn: [[usize; 2]; 3], wall: [[usize; 2]; 3]| {
        BoundaryConditions::new(vec![
            mk(conn, "interblock", 3),
            mk(wall, "slipWall", 0),
            mk([[0, 4], [0, 0], [0, 4]], "slipWall", 0),
            mk([[0, 4], [4, 4], [0, 4]], "slipWall", 0),
            mk([[0, 4], [0, 4], [0, 0]], "slipWall", 0),
            mk([[0, 4], [0, 4], [4, 4]], "slipWall", 0),
        ])
    };
    let bcs = vec![
        faces([[4, 4], [0, 4], [0, 4]], [[0, 0], [0, 4], [0, 4]]),
        faces([[0, 0], [0, 4], [0, 4]], [[4, 4], [0, 4], [0, 4]]),
    ];
    let mut decomp = Decomposition::new(2, 2);
    decomp.send_to_proc(1, 0, 1);
    (grid, bcs, decomp)
}

#[test]
#[serial]
fn full_pipeline_round_trips_across_two_ranks() {
    let (grid, bcs, decomp) = two_block_mesh();
    let conns = interblock_connections(&bcs, &grid, &decomp).unwrap();
    let all_blocks: Vec<ProcBlock> = grid
        .iter()
        .zip(&bcs)
        .enumerate()
        .map(|(gid, (g, bc))| ProcBlock::new(gid, &decomp, g.clone(), bc.clone()))
        .collect();
    let sent = all_blocks.clone();
    let num_conns = conns.len();

    let worker = std::thread::spawn(move || {
        let comm = LocalComm::new(1, 2);
        let n = scatter_num_blocks(&comm, None).unwrap();
        assert_eq!(n, 1);
        let conns = broadcast_connections(&comm, None).unwrap();
        assert_eq!(conns.len(), num_conns);

        let mut mine = distribute_blocks(&comm, None, n).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].global_id, 1);
        assert_eq!(mine[0].rank, 1);

        // Pretend the solver advanced this block's state.
        for s in mine[0].state.iter_mut() {
            s.0[0] = 7.0;
        }
        gather_blocks(&comm, mine, None).unwrap();
    });

    let comm = LocalComm::new(0, 2);
    let n = scatter_num_blocks(&comm, Some(&decomp)).unwrap();
    assert_eq!(n, 1);
    let shared = broadcast_connections(&comm, Some(&conns)).unwrap();
    assert_eq!(shared.len(), num_conns);

    let mine = distribute_blocks(&comm, Some(all_blocks), n).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].global_id, 0);

    let gathered = gather_blocks(&comm, mine, Some(&decomp))
        .unwrap()
        .expect("root gathers the full mesh");
    worker.join().unwrap();

    assert_eq!(gathered.len(), 2);
    assert_eq!(gathered[0], sent[0]);
    // The remote block came back with its updated state but intact
    // geometry and boundary conditions.
    assert_eq!(gathered[1].geom, sent[1].geom);
    assert_eq!(gathered[1].bc, sent[1].bc);
    assert!(gathered[1].state.iter().all(|s| s.0[0] == 7.0));
}

#[test]
#[serial]
fn gather_preserves_ascending_global_order() {
    // Three blocks: rank 0 owns block 1, rank 1 owns blocks 0 and 2.
    let sizes = [[2, 2, 2], [3, 2, 2], [2, 3, 2]];
    let grid: Vec<_> = sizes.iter().map(|&c| StructuredBlock::unit(c)).collect();
    let bcs: Vec<_> = sizes
        .iter()
        .map(|&c| BoundaryConditions::whole_block("slipWall", c))
        .collect();
    let mut decomp = Decomposition::new(3, 2);
    decomp.send_to_proc(0, 0, 1);
    decomp.send_to_proc(2, 0, 1);

    let blocks: Vec<ProcBlock> = grid
        .iter()
        .zip(&bcs)
        .enumerate()
        .map(|(gid, (g, bc))| ProcBlock::new(gid, &decomp, g.clone(), bc.clone()))
        .collect();
    let expected = blocks.clone();
    let remote: Vec<ProcBlock> = blocks
        .iter()
        .filter(|b| b.rank == 1)
        .cloned()
        .collect();
    let local: Vec<ProcBlock> = blocks.into_iter().filter(|b| b.rank == 0).collect();

    let worker = std::thread::spawn(move || {
        let comm = LocalComm::new(1, 2);
        // Hand the blocks over in scrambled order; the sender must
        // reorder by global id itself.
        let scrambled: Vec<_> = remote.into_iter().rev().collect();
        gather_blocks(&comm, scrambled, None).unwrap();
    });

    let comm = LocalComm::new(0, 2);
    let gathered = gather_blocks(&comm, local, Some(&decomp))
        .unwrap()
        .expect("root side");
    worker.join().unwrap();

    let ids: Vec<_> = gathered.iter().map(|b| b.global_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(gathered, expected);
}
