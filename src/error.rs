//! MeshDecompError: unified error type for mesh-decomp public APIs.
//!
//! Every fatal condition in the decomposition/topology pipeline is a variant
//! here. Fatal means the configuration or the call sequence is wrong, not
//! that a transient condition occurred: callers are expected to escalate to
//! full-run termination rather than retry.

use crate::geometry::Axis;
use thiserror::Error;

/// Unified error type for mesh-decomp operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshDecompError {
    /// Manual decomposition requires one block per processor.
    #[error(
        "manual decomposition requires one block per processor: \
         grid has {blocks} blocks but the run uses {procs} processors"
    )]
    BlockCountMismatch { blocks: usize, procs: usize },

    /// A split index must leave at least one cell on each side of the cut.
    #[error("invalid split index {index} along {axis}: block has {cells} cells")]
    InvalidSplitIndex {
        axis: Axis,
        index: usize,
        cells: usize,
    },

    /// A block axis needs at least two node coordinates to bound one cell.
    #[error("block has {nodes} nodes along {axis}: at least two are required")]
    InvalidBlock { axis: Axis, nodes: usize },

    /// A boundary surface must have exactly one degenerate index range.
    #[error("malformed boundary surface `{0}`: expected exactly one constant index direction")]
    InvalidSurface(String),

    /// Join called on blocks that were not produced by a matching prior split.
    #[error("cannot join blocks along {axis}: {reason}")]
    JoinMismatch { axis: Axis, reason: String },

    /// A connection surface has no point-matched partner anywhere in the mesh.
    #[error("no matching partner found for connection patch on block {block} (tag {tag})")]
    UnmatchedPatch { block: usize, tag: i32 },

    /// Two patches were paired but none of the 8 square symmetries maps one
    /// set of corners onto the other.
    #[error(
        "patches on blocks {block_first} and {block_second} match by tag but no \
         corner correspondence exists"
    )]
    OrientationUndetermined {
        block_first: usize,
        block_second: usize,
    },

    /// Decomposition method string was not one of the supported strategies.
    #[error("unknown decomposition method `{0}` (expected \"manual\" or \"cubic\")")]
    UnknownDecompMethod(String),

    /// A packed buffer ended before the advertised contents did.
    #[error("truncated buffer: needed {expected} more bytes, {got} remain")]
    Truncated { expected: usize, got: usize },

    /// A point-to-point transfer failed or delivered a malformed payload.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
}
