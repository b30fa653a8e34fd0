//! Thin façade over intra-process or MPI message passing.
//!
//! Messages are contiguous byte slices. All handles are waitable but
//! non-blocking; the block exchange in [`blocks`](super::blocks) calls
//! `.wait()` before it trusts a buffer.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Typed message tag. Protocol stages claim disjoint bases and offset
/// within them, keeping concurrent exchanges collision-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(base: u16) -> Self {
        Self(base)
    }

    /// Tag `n` slots past this one.
    pub const fn offset(self, n: u16) -> Self {
        Self(self.0 + n)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: CommTag, buf: &mut [u8]) -> Self::RecvHandle;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-rank no-op comm for serial runs and unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn isend(&self, _peer: usize, _tag: CommTag, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: CommTag, _buf: &mut [u8]) {}
}

// --- LocalComm: intra-process / multi-thread ---

type Key = (usize, usize, u16); // (src, dst, tag)
type Queue = Arc<Mutex<VecDeque<Bytes>>>;

static MAILBOX: Lazy<DashMap<Key, Queue>> = Lazy::new(DashMap::new);

pub struct LocalHandle {
    buf: Arc<Mutex<Option<Vec<u8>>>>,
    handle: Option<JoinHandle<()>>,
}

impl Wait for LocalHandle {
    fn wait(mut self) -> Option<Vec<u8>> {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let mut guard = self.buf.lock();
        guard.take()
    }
}

/// In-process comm: each simulated rank gets its own instance, messages
/// travel through a shared mailbox keyed by (src, dst, tag). Messages on
/// the same key queue in send order.
#[derive(Clone, Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
}

impl LocalComm {
    pub fn new(rank: usize, size: usize) -> Self {
        Self { rank, size }
    }

    fn queue(key: Key) -> Queue {
        MAILBOX.entry(key).or_default().clone()
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) {
        let queue = Self::queue((self.rank, peer, tag.as_u16()));
        queue.lock().push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: CommTag, buf: &mut [u8]) -> LocalHandle {
        let queue = Self::queue((peer, self.rank, tag.as_u16()));
        let out = Arc::new(Mutex::new(None));
        let out_clone = out.clone();
        let want = buf.len();
        let handle = std::thread::spawn(move || loop {
            if let Some(bytes) = queue.lock().pop_front() {
                let take = want.min(bytes.len());
                *out_clone.lock() = Some(bytes[..take].to_vec());
                break;
            }
            std::thread::yield_now();
        });
        LocalHandle {
            buf: out,
            handle: Some(handle),
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---

#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{CommTag, Communicator, Wait};
    use mpi::environment::Universe;
    use mpi::topology::SystemCommunicator;
    use mpi::traits::*;

    pub struct MpiComm {
        _universe: Universe,
        world: SystemCommunicator,
        rank: usize,
        size: usize,
    }

    // SystemCommunicator handles are plain MPI_Comm values; the library
    // never aliases mutable state through them.
    unsafe impl Send for MpiComm {}
    unsafe impl Sync for MpiComm {}

    impl MpiComm {
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                _universe: universe,
                world,
                rank,
                size,
            })
        }
    }

    pub struct MpiRecvHandle(Option<Vec<u8>>);

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiRecvHandle;

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn isend(&self, peer: usize, tag: CommTag, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, tag.as_u16() as i32);
        }

        fn irecv(&self, peer: usize, tag: CommTag, buf: &mut [u8]) -> MpiRecvHandle {
            let (mut data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(tag.as_u16() as i32);
            data.truncate(buf.len());
            MpiRecvHandle(Some(data))
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
