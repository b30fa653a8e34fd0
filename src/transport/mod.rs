//! Message-passing transport: communicator façade, wire records and the
//! block distribution choreography.

pub mod blocks;
pub mod communicator;
pub mod wire;

pub use blocks::{
    broadcast_connections, distribute_blocks, gather_blocks, scatter_num_blocks, ProcBlock, ROOT,
};
pub use communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
#[cfg(feature = "mpi-support")]
pub use communicator::MpiComm;
pub use wire::{FlowState, WireInterblock, NUM_FLOW_VARS};
