//! Fixed-layout wire records.
//!
//! Bulk payloads cross ranks as `bytemuck` Pod records so both sides can
//! cast straight between byte buffers and typed slices. Record layouts
//! are `repr(C)`; the interblock record additionally publishes a field
//! layout derived from the live type at startup, so the two sides agree
//! on offsets without hard-coding them.

use bytemuck::{Pod, Zeroable};
use once_cell::sync::Lazy;
use static_assertions::const_assert_eq;

use crate::error::MeshDecompError;
use crate::topology::{Interblock, Orientation};

/// Number of conserved flow variables per cell.
pub const NUM_FLOW_VARS: usize = 5;

/// Count prefix for variable-length payloads.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct WireCount(pub u32);

/// Per-cell 3-vector (temperature gradient in the solution payload).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WireVec3(pub [f64; 3]);

/// Symmetric rank-2 tensor, upper triangle in row order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WireSymTensor(pub [f64; 6]);

/// Laminar and eddy viscosity for one cell.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WireScalarPair {
    pub laminar: f64,
    pub eddy: f64,
}

/// Conserved variables for one cell.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlowState(pub [f64; NUM_FLOW_VARS]);

const_assert_eq!(std::mem::size_of::<WireVec3>(), 24);
const_assert_eq!(std::mem::size_of::<WireSymTensor>(), 48);
const_assert_eq!(std::mem::size_of::<WireScalarPair>(), 16);
const_assert_eq!(std::mem::size_of::<FlowState>(), 40);

/// One interblock connection on the wire. Paired fields are
/// `[first, second]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct WireInterblock {
    pub rank: [i32; 2],
    pub block: [i32; 2],
    pub local_block: [i32; 2],
    pub face: [i32; 2],
    pub d1_start: [i32; 2],
    pub d1_end: [i32; 2],
    pub d2_start: [i32; 2],
    pub d2_end: [i32; 2],
    pub const_index: [i32; 2],
    pub border: [u8; 8],
    pub orientation: i32,
}

// 18 i32 pair slots, 8 border bytes, the orientation code; no padding.
const_assert_eq!(std::mem::size_of::<WireInterblock>(), 84);

/// Offset and element count of one record field.
#[derive(Debug, Clone, Copy)]
pub struct FieldLayout {
    pub name: &'static str,
    pub offset: usize,
    pub len: usize,
}

/// Field layout of [`WireInterblock`], derived from the live type.
#[derive(Debug, Clone, Copy)]
pub struct InterblockLayout {
    pub fields: [FieldLayout; 11],
    pub extent: usize,
}

pub static INTERBLOCK_LAYOUT: Lazy<InterblockLayout> = Lazy::new(|| {
    use std::mem::offset_of;
    let pair = |name, offset| FieldLayout {
        name,
        offset,
        len: 2,
    };
    InterblockLayout {
        fields: [
            pair("rank", offset_of!(WireInterblock, rank)),
            pair("block", offset_of!(WireInterblock, block)),
            pair("local_block", offset_of!(WireInterblock, local_block)),
            pair("face", offset_of!(WireInterblock, face)),
            pair("d1_start", offset_of!(WireInterblock, d1_start)),
            pair("d1_end", offset_of!(WireInterblock, d1_end)),
            pair("d2_start", offset_of!(WireInterblock, d2_start)),
            pair("d2_end", offset_of!(WireInterblock, d2_end)),
            pair("const_index", offset_of!(WireInterblock, const_index)),
            FieldLayout {
                name: "border",
                offset: offset_of!(WireInterblock, border),
                len: 8,
            },
            FieldLayout {
                name: "orientation",
                offset: offset_of!(WireInterblock, orientation),
                len: 1,
            },
        ],
        extent: std::mem::size_of::<WireInterblock>(),
    }
});

impl From<&Interblock> for WireInterblock {
    fn from(c: &Interblock) -> Self {
        let pair = |a: usize, b: usize| [a as i32, b as i32];
        let border = c.border();
        Self {
            rank: pair(c.rank_first(), c.rank_second()),
            block: pair(c.block_first(), c.block_second()),
            local_block: pair(c.local_block_first(), c.local_block_second()),
            face: [c.face_first() as i32, c.face_second() as i32],
            d1_start: pair(c.dir1_start_first(), c.dir1_start_second()),
            d1_end: pair(c.dir1_end_first(), c.dir1_end_second()),
            d2_start: pair(c.dir2_start_first(), c.dir2_start_second()),
            d2_end: pair(c.dir2_end_first(), c.dir2_end_second()),
            const_index: pair(c.const_index_first(), c.const_index_second()),
            border: border.map(u8::from),
            orientation: c.orientation().code() as i32,
        }
    }
}

impl WireInterblock {
    pub fn into_interblock(self) -> Result<Interblock, MeshDecompError> {
        let orientation = Orientation::from_code(self.orientation as u8).ok_or(
            MeshDecompError::OrientationUndetermined {
                block_first: self.block[0] as usize,
                block_second: self.block[1] as usize,
            },
        )?;
        let pair = |p: [i32; 2]| [p[0] as usize, p[1] as usize];
        Ok(Interblock::from_raw(
            pair(self.rank),
            pair(self.block),
            pair(self.local_block),
            [self.face[0] as u8, self.face[1] as u8],
            pair(self.d1_start),
            pair(self.d1_end),
            pair(self.d2_start),
            pair(self.d2_end),
            pair(self.const_index),
            self.border.map(|b| b != 0),
            orientation,
        ))
    }
}

/// Cast a typed record slice to bytes.
pub fn encode_records<T: Pod>(records: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(records).to_vec()
}

/// Read back a typed record slice from bytes. The buffer is read
/// unaligned, so it may come straight off a receive.
pub fn decode_records<T: Pod>(buf: &[u8]) -> Result<Vec<T>, MeshDecompError> {
    let size = std::mem::size_of::<T>();
    if buf.len() % size != 0 {
        return Err(MeshDecompError::Truncated {
            expected: buf.len().div_ceil(size) * size,
            got: buf.len(),
        });
    }
    Ok(buf
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_the_record_without_gaps() {
        let layout = &*INTERBLOCK_LAYOUT;
        assert_eq!(layout.extent, 84);
        let mut end = 0;
        for f in &layout.fields {
            assert_eq!(f.offset, end, "field {} starts at its predecessor's end", f.name);
            let elem = if f.name == "border" { 1 } else { 4 };
            end = f.offset + f.len * elem;
        }
        assert_eq!(end, layout.extent);
    }

    #[test]
    fn interblock_survives_the_wire() {
        let wire = WireInterblock {
            rank: [0, 2],
            block: [1, 3],
            local_block: [0, 1],
            face: [2, 1],
            d1_start: [0, 0],
            d1_end: [8, 8],
            d2_start: [0, 0],
            d2_end: [4, 4],
            const_index: [10, 0],
            border: [1, 0, 0, 1, 0, 0, 0, 0],
            orientation: 1,
        };
        let decoded = wire.into_interblock().unwrap();
        assert_eq!(WireInterblock::from(&decoded), wire);
    }

    #[test]
    fn bad_orientation_code_is_rejected() {
        let wire = WireInterblock {
            orientation: 9,
            ..bytemuck::Zeroable::zeroed()
        };
        assert!(wire.into_interblock().is_err());
    }

    #[test]
    fn decode_rejects_partial_records() {
        let states = vec![FlowState([1.0, 0.0, 0.0, 0.0, 2.5])];
        let mut bytes = encode_records(&states);
        let last = bytes.pop().unwrap();
        let err = decode_records::<FlowState>(&bytes).unwrap_err();
        assert!(matches!(err, MeshDecompError::Truncated { .. }));
        bytes.push(last);
        let back = decode_records::<FlowState>(&bytes).unwrap();
        assert_eq!(back, states);
    }
}
