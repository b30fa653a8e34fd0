//! # mesh-decomp
//!
//! mesh-decomp decomposes structured multi-block volumetric meshes for
//! distributed solvers. A mesh arrives as a list of blocks, each with a
//! tiling of boundary surfaces; the library assigns blocks to processor
//! ranks (one-to-one, or by iterative load balancing with axis-aligned
//! splits), keeps every block's boundary conditions consistent through
//! those splits, discovers the interblock connections with their full
//! relative orientation, and moves blocks between ranks over a pluggable
//! message-passing backend.
//!
//! ## Features
//! - Boundary-condition model with the tiling invariant maintained under
//!   split, dependent split and join
//! - Manual and cubic (load-balancing) decomposition strategies with a
//!   complete split history
//! - Interblock discovery by corner matching, covering all eight relative
//!   in-plane orientations
//! - Serial, in-process and MPI communication backends behind one
//!   `Communicator` trait
//!
//! ## Usage
//! Add `mesh-decomp` as a dependency in your `Cargo.toml` and enable
//! features as needed:
//!
//! ```toml
//! [dependencies]
//! mesh-decomp = "0.3"
//! # Optional features:
//! # features = ["mpi-support"]
//! ```

pub mod bc;
pub mod config;
pub mod decomp;
pub mod error;
pub mod geometry;
pub mod topology;
pub mod transport;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::bc::{BoundaryConditions, BoundarySurface, Face, Side};
    pub use crate::config::{DecompMethod, RunConfig};
    pub use crate::decomp::{
        cubic_decomposition, decompose, manual_decomposition, Decomposition, LoadStats,
    };
    pub use crate::error::MeshDecompError;
    pub use crate::geometry::{Axis, StructuredBlock};
    pub use crate::topology::{interblock_connections, Interblock, Orientation};
    pub use crate::transport::{
        broadcast_connections, distribute_blocks, gather_blocks, scatter_num_blocks, CommTag,
        Communicator, LocalComm, NoComm, ProcBlock, Wait,
    };
    #[cfg(feature = "mpi-support")]
    pub use crate::transport::MpiComm;
}
