//! Interblock topology: which boundary patches across the whole mesh are
//! point-matched partners, and how their local axes line up.

pub mod discovery;
pub mod interblock;
pub mod orientation;

pub use discovery::{interblock_connections, patch_match};
pub use interblock::Interblock;
pub use orientation::{InPlaneDir, Orientation};
