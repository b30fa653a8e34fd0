//! Boundary-condition data model for one structured block.
//!
//! A block's boundary is tiled by tagged rectangular [`BoundarySurface`]s,
//! collected per block into [`BoundaryConditions`]. Surfaces whose type is
//! a point-matched connection are realized geometrically as [`Patch`]es for
//! interblock discovery.

pub mod conditions;
pub mod patch;
pub mod surface;

pub use conditions::BoundaryConditions;
pub use patch::Patch;
pub use surface::{BoundarySurface, Face, Side};

/// Boundary-condition type used for point-matched connections, both for the
/// synthetic pair introduced by a block split and for user-declared matched
/// pairs sharing a tag.
pub const INTERBLOCK: &str = "interblock";

/// Whether a boundary-condition type denotes a point-matched connection.
#[inline]
pub fn is_connection(bc_type: &str) -> bool {
    bc_type == INTERBLOCK
}
