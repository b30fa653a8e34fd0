//! Block distribution and gather-back.
//!
//! Rank 0 owns the full mesh after decomposition. The choreography is:
//! scatter per-rank block counts, broadcast the connection list, then
//! send each non-resident block (geometry, boundary conditions,
//! solution arrays) to its owner. Gathering back reverses the flow;
//! every rank sends its blocks in ascending global id and the root
//! receives in ascending global id, so no pair of ranks ever waits on
//! each other.

use bytes::{Buf, BufMut, BytesMut};
use itertools::Itertools;
use log::debug;

use crate::bc::BoundaryConditions;
use crate::decomp::Decomposition;
use crate::error::MeshDecompError;
use crate::geometry::StructuredBlock;
use crate::topology::Interblock;

use super::communicator::{CommTag, Communicator, Wait};
use super::wire::{
    decode_records, encode_records, FlowState, WireCount, WireInterblock, WireScalarPair,
    WireSymTensor, WireVec3,
};

pub const ROOT: usize = 0;

pub const TAG_NUM_BLOCKS: CommTag = CommTag::new(0x0100);
pub const TAG_CONNECTIONS: CommTag = CommTag::new(0x0200);
pub const TAG_BLOCKS: CommTag = CommTag::new(0x0300);
pub const TAG_GATHER: CommTag = CommTag::new(0x0400);

/// One block as held by its owning rank: geometry, boundary conditions
/// and per-cell solution arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcBlock {
    pub global_id: usize,
    pub parent_block: usize,
    pub rank: usize,
    pub local_pos: usize,
    pub geom: StructuredBlock,
    pub bc: BoundaryConditions,
    pub state: Vec<FlowState>,
    pub temperature_grad: Vec<WireVec3>,
    pub strain_rate: Vec<WireSymTensor>,
    pub viscosity: Vec<WireScalarPair>,
}

impl ProcBlock {
    /// Assemble a block with zero-initialized solution arrays.
    pub fn new(
        global_id: usize,
        decomp: &Decomposition,
        geom: StructuredBlock,
        bc: BoundaryConditions,
    ) -> Self {
        let cells = geom.num_cells_total();
        Self {
            global_id,
            parent_block: decomp.parent_block(global_id),
            rank: decomp.rank(global_id),
            local_pos: decomp.local_position(global_id),
            geom,
            bc,
            state: vec![FlowState([0.0; 5]); cells],
            temperature_grad: vec![WireVec3([0.0; 3]); cells],
            strain_rate: vec![WireSymTensor([0.0; 6]); cells],
            viscosity: vec![WireScalarPair {
                laminar: 0.0,
                eddy: 0.0,
            }; cells],
        }
    }

    fn pack(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.global_id as u32);
        buf.put_u32_le(self.parent_block as u32);
        buf.put_u32_le(self.rank as u32);
        buf.put_u32_le(self.local_pos as u32);
        for axis in crate::geometry::Axis::ALL {
            let coords = self.geom.axis_coords(axis);
            buf.put_u32_le(coords.len() as u32);
            for &c in coords {
                buf.put_f64_le(c);
            }
        }
        self.bc.pack(buf);
        buf.put_u32_le(self.state.len() as u32);
        buf.put_slice(&encode_records(&self.state));
        buf.put_slice(&encode_records(&self.temperature_grad));
        buf.put_slice(&encode_records(&self.strain_rate));
        buf.put_slice(&encode_records(&self.viscosity));
    }

    fn unpack(mut buf: impl Buf) -> Result<Self, MeshDecompError> {
        need(buf.remaining(), 16)?;
        let global_id = buf.get_u32_le() as usize;
        let parent_block = buf.get_u32_le() as usize;
        let rank = buf.get_u32_le() as usize;
        let local_pos = buf.get_u32_le() as usize;

        let x = read_axis(&mut buf)?;
        let y = read_axis(&mut buf)?;
        let z = read_axis(&mut buf)?;
        let geom = StructuredBlock::new(x, y, z)?;

        let bc = BoundaryConditions::unpack(&mut buf)?;

        need(buf.remaining(), 4)?;
        let cells = buf.get_u32_le() as usize;
        let state = read_records(&mut buf, cells)?;
        let temperature_grad = read_records(&mut buf, cells)?;
        let strain_rate = read_records(&mut buf, cells)?;
        let viscosity = read_records(&mut buf, cells)?;

        Ok(Self {
            global_id,
            parent_block,
            rank,
            local_pos,
            geom,
            bc,
            state,
            temperature_grad,
            strain_rate,
            viscosity,
        })
    }
}

fn need(got: usize, n: usize) -> Result<(), MeshDecompError> {
    if got < n {
        Err(MeshDecompError::Truncated { expected: n, got })
    } else {
        Ok(())
    }
}

fn read_axis<B: Buf>(buf: &mut B) -> Result<Vec<f64>, MeshDecompError> {
    need(buf.remaining(), 4)?;
    let n = buf.get_u32_le() as usize;
    need(buf.remaining(), 8 * n)?;
    Ok((0..n).map(|_| buf.get_f64_le()).collect())
}

fn read_records<T: bytemuck::Pod, B: Buf>(
    buf: &mut B,
    count: usize,
) -> Result<Vec<T>, MeshDecompError> {
    let len = count * std::mem::size_of::<T>();
    need(buf.remaining(), len)?;
    decode_records(&buf.copy_to_bytes(len))
}

fn no_payload(neighbor: usize) -> MeshDecompError {
    MeshDecompError::CommError {
        neighbor,
        reason: "receive completed without a payload".into(),
    }
}

fn send_sized<C: Communicator>(comm: &C, peer: usize, tag: CommTag, payload: &[u8]) {
    let count = encode_records(&[WireCount(payload.len() as u32)]);
    comm.isend(peer, tag, &count).wait();
    comm.isend(peer, tag.offset(1), payload).wait();
}

fn recv_sized<C: Communicator>(
    comm: &C,
    peer: usize,
    tag: CommTag,
) -> Result<Vec<u8>, MeshDecompError> {
    let mut count_buf = [0u8; 4];
    let count = comm
        .irecv(peer, tag, &mut count_buf)
        .wait()
        .ok_or_else(|| no_payload(peer))?;
    let n = decode_records::<WireCount>(&count)?
        .first()
        .ok_or_else(|| no_payload(peer))?
        .0 as usize;
    let mut buf = vec![0u8; n];
    let payload = comm
        .irecv(peer, tag.offset(1), &mut buf)
        .wait()
        .ok_or_else(|| no_payload(peer))?;
    if payload.len() != n {
        return Err(MeshDecompError::Truncated {
            expected: n,
            got: payload.len(),
        });
    }
    Ok(payload)
}

/// Tell every rank how many blocks it will own. Returns the calling
/// rank's count. Only the root holds the decomposition.
pub fn scatter_num_blocks<C: Communicator>(
    comm: &C,
    decomp: Option<&Decomposition>,
) -> Result<usize, MeshDecompError> {
    if comm.rank() == ROOT {
        let decomp = decomp.ok_or_else(|| no_payload(ROOT))?;
        let counts = decomp.num_blocks_on_all_procs();
        for (peer, &n) in counts.iter().enumerate().skip(1) {
            let msg = encode_records(&[WireCount(n as u32)]);
            comm.isend(peer, TAG_NUM_BLOCKS, &msg).wait();
        }
        Ok(counts[ROOT])
    } else {
        let mut buf = [0u8; 4];
        let data = comm
            .irecv(ROOT, TAG_NUM_BLOCKS, &mut buf)
            .wait()
            .ok_or_else(|| no_payload(ROOT))?;
        Ok(decode_records::<WireCount>(&data)?
            .first()
            .ok_or_else(|| no_payload(ROOT))?
            .0 as usize)
    }
}

/// Share the connection list with every rank. Only the root passes one
/// in; everyone returns the full list.
pub fn broadcast_connections<C: Communicator>(
    comm: &C,
    connections: Option<&[Interblock]>,
) -> Result<Vec<Interblock>, MeshDecompError> {
    if comm.rank() == ROOT {
        let connections = connections.ok_or_else(|| no_payload(ROOT))?;
        let wire: Vec<WireInterblock> = connections.iter().map(WireInterblock::from).collect();
        let payload = encode_records(&wire);
        for peer in 1..comm.size() {
            send_sized(comm, peer, TAG_CONNECTIONS, &payload);
        }
        Ok(connections.to_vec())
    } else {
        let payload = recv_sized(comm, ROOT, TAG_CONNECTIONS)?;
        decode_records::<WireInterblock>(&payload)?
            .into_iter()
            .map(WireInterblock::into_interblock)
            .collect()
    }
}

/// Hand each rank its blocks. The root passes the complete block list
/// and keeps its own share; workers receive `num_local` blocks. Every
/// rank gets back its resident blocks ordered by local slot.
pub fn distribute_blocks<C: Communicator>(
    comm: &C,
    all_blocks: Option<Vec<ProcBlock>>,
    num_local: usize,
) -> Result<Vec<ProcBlock>, MeshDecompError> {
    let mut resident = if comm.rank() == ROOT {
        let all = all_blocks.ok_or_else(|| no_payload(ROOT))?;
        let mut mine = Vec::new();
        for block in all.into_iter().sorted_by_key(|b| b.global_id) {
            if block.rank == ROOT {
                mine.push(block);
            } else {
                let mut buf = BytesMut::new();
                block.pack(&mut buf);
                debug!(
                    "sending block {} ({} bytes) to rank {}",
                    block.global_id,
                    buf.len(),
                    block.rank
                );
                send_sized(comm, block.rank, TAG_BLOCKS, &buf);
            }
        }
        mine
    } else {
        (0..num_local)
            .map(|_| {
                let payload = recv_sized(comm, ROOT, TAG_BLOCKS)?;
                ProcBlock::unpack(payload.as_slice())
            })
            .collect::<Result<Vec<_>, _>>()?
    };
    resident.sort_by_key(|b| b.local_pos);
    Ok(resident)
}

/// Collect every block back on the root. Workers send their blocks in
/// ascending global id; the root receives in ascending global id, which
/// matches each worker's send order. Returns the full, globally ordered
/// block list on the root and `None` elsewhere.
pub fn gather_blocks<C: Communicator>(
    comm: &C,
    resident: Vec<ProcBlock>,
    decomp: Option<&Decomposition>,
) -> Result<Option<Vec<ProcBlock>>, MeshDecompError> {
    if comm.rank() == ROOT {
        let decomp = decomp.ok_or_else(|| no_payload(ROOT))?;
        let mut by_id: std::collections::BTreeMap<usize, ProcBlock> = resident
            .into_iter()
            .map(|b| (b.global_id, b))
            .collect();
        let mut all = Vec::with_capacity(decomp.size());
        for gid in 0..decomp.size() {
            let owner = decomp.rank(gid);
            let block = if owner == ROOT {
                by_id.remove(&gid).ok_or_else(|| no_payload(ROOT))?
            } else {
                let payload = recv_sized(comm, owner, TAG_GATHER)?;
                ProcBlock::unpack(payload.as_slice())?
            };
            all.push(block);
        }
        Ok(Some(all))
    } else {
        for block in resident.into_iter().sorted_by_key(|b| b.global_id) {
            let mut buf = BytesMut::new();
            block.pack(&mut buf);
            send_sized(comm, ROOT, TAG_GATHER, &buf);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;

    fn sample_block(decomp: &Decomposition, gid: usize, cells: [usize; 3]) -> ProcBlock {
        let geom = StructuredBlock::unit(cells);
        let bc = BoundaryConditions::whole_block("slipWall", cells);
        let mut b = ProcBlock::new(gid, decomp, geom, bc);
        for (i, s) in b.state.iter_mut().enumerate() {
            s.0[0] = 1.0 + i as f64;
        }
        b
    }

    #[test]
    fn proc_block_pack_unpack_round_trip() {
        let mut decomp = Decomposition::new(2, 2);
        decomp.send_to_proc(1, 0, 1);
        let block = sample_block(&decomp, 1, [3, 4, 5]);

        let mut buf = BytesMut::new();
        block.pack(&mut buf);
        let back = ProcBlock::unpack(buf.freeze()).unwrap();
        assert_eq!(back, block);
        assert_eq!(back.geom.num_cells(Axis::K), 5);
    }

    #[test]
    fn unpack_rejects_truncated_payload() {
        let decomp = Decomposition::new(1, 1);
        let block = sample_block(&decomp, 0, [2, 2, 2]);
        let mut buf = BytesMut::new();
        block.pack(&mut buf);
        let short = &buf[..buf.len() - 9];
        assert!(matches!(
            ProcBlock::unpack(short),
            Err(MeshDecompError::Truncated { .. })
        ));
    }
}
