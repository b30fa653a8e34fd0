//! Property tests for the byte encoding of boundary conditions.

use bytes::BytesMut;
use mesh_decomp::bc::BoundaryConditions;
use mesh_decomp::geometry::Axis;
use proptest::prelude::*;

fn arb_cells() -> impl Strategy<Value = [usize; 3]> {
    [4usize..12, 4usize..12, 4usize..12]
}

proptest! {
    #[test]
    fn whole_block_survives_pack_unpack(cells in arb_cells()) {
        let bc = BoundaryConditions::whole_block("viscousWall", cells);
        let mut buf = BytesMut::new();
        bc.pack(&mut buf);
        let back = BoundaryConditions::unpack(&mut buf.freeze()).unwrap();
        prop_assert_eq!(back, bc);
    }

    #[test]
    fn split_block_survives_pack_unpack(
        cells in arb_cells(),
        axis in prop_oneof![Just(Axis::I), Just(Axis::J), Just(Axis::K)],
        cut in 2usize..4,
    ) {
        let mut bc = BoundaryConditions::whole_block("slipWall", cells);
        let (upper, _) = bc.split(axis, cut, 3).unwrap();

        for side in [&bc, &upper] {
            let mut buf = BytesMut::new();
            side.pack(&mut buf);
            let back = BoundaryConditions::unpack(&mut buf.freeze()).unwrap();
            prop_assert_eq!(&back, side);
        }
    }

    #[test]
    fn truncation_never_panics(cells in arb_cells(), keep in 0usize..40) {
        let bc = BoundaryConditions::whole_block("slipWall", cells);
        let mut buf = BytesMut::new();
        bc.pack(&mut buf);
        let cut = keep.min(buf.len().saturating_sub(1));
        let mut short = buf.freeze().slice(..cut);
        prop_assert!(BoundaryConditions::unpack(&mut short).is_err());
    }
}
