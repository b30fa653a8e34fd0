//! Block-to-processor decomposition.
//!
//! A [`Decomposition`] records, for every global block, the rank that owns
//! it, the pre-split block it descends from, and its local slot on the
//! owning rank. Splits performed while balancing are kept as an ordered
//! [`SplitRecord`] history so that connectivity discovery and gather can
//! reconstruct the pre-split picture.

use std::fmt;

use crate::geometry::{Axis, StructuredBlock};

pub mod strategy;

pub use strategy::{cubic_decomposition, decompose, manual_decomposition, LoadStats};

/// One split performed during load balancing, in the order applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRecord {
    /// Global id of the block that was split (keeps the lower half).
    pub lower: usize,
    /// Global id assigned to the new upper half.
    pub upper: usize,
    /// Face index of the cut inside the pre-split block.
    pub index: usize,
    /// Axis normal to the cut.
    pub axis: Axis,
}

/// What the balancer decided to move from an overloaded rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Reassign an entire block.
    Whole { block: usize },
    /// Split a block and reassign its lower half.
    Split {
        block: usize,
        axis: Axis,
        index: usize,
    },
}

/// Assignment of global blocks to ranks, with local ordering and split
/// provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    rank: Vec<usize>,
    parent_block: Vec<usize>,
    local_pos: Vec<usize>,
    split_history: Vec<SplitRecord>,
    num_procs: usize,
}

impl Decomposition {
    /// Initial state: every block on rank 0, identity parentage, local
    /// slots in input order.
    pub fn new(num_blocks: usize, num_procs: usize) -> Self {
        Self {
            rank: vec![0; num_blocks],
            parent_block: (0..num_blocks).collect(),
            local_pos: (0..num_blocks).collect(),
            split_history: Vec::new(),
            num_procs,
        }
    }

    /// Owning rank of a global block.
    #[inline]
    pub fn rank(&self, block: usize) -> usize {
        self.rank[block]
    }

    /// Pre-split ancestor of a global block.
    #[inline]
    pub fn parent_block(&self, block: usize) -> usize {
        self.parent_block[block]
    }

    /// Position of a block among the blocks on its owning rank.
    #[inline]
    pub fn local_position(&self, block: usize) -> usize {
        self.local_pos[block]
    }

    #[inline]
    pub fn num_procs(&self) -> usize {
        self.num_procs
    }

    /// Total number of global blocks.
    #[inline]
    pub fn size(&self) -> usize {
        self.rank.len()
    }

    #[inline]
    pub fn num_splits(&self) -> usize {
        self.split_history.len()
    }

    /// Splits in the order they were applied.
    pub fn split_history(&self) -> &[SplitRecord] {
        &self.split_history
    }

    /// Cells per processor if the load were spread perfectly.
    pub fn ideal_load(&self, grid: &[StructuredBlock]) -> f64 {
        let total: usize = grid.iter().map(StructuredBlock::num_cells_total).sum();
        total as f64 / self.num_procs as f64
    }

    /// Cell count assigned to one rank.
    pub fn proc_load(&self, grid: &[StructuredBlock], proc: usize) -> usize {
        self.rank
            .iter()
            .zip(grid)
            .filter(|(&r, _)| r == proc)
            .map(|(_, b)| b.num_cells_total())
            .sum()
    }

    /// Heaviest per-rank load.
    pub fn max_load(&self, grid: &[StructuredBlock]) -> usize {
        (0..self.num_procs)
            .map(|p| self.proc_load(grid, p))
            .max()
            .unwrap_or(0)
    }

    /// Lightest per-rank load.
    pub fn min_load(&self, grid: &[StructuredBlock]) -> usize {
        (0..self.num_procs)
            .map(|p| self.proc_load(grid, p))
            .min()
            .unwrap_or(0)
    }

    /// Relative deviation of one rank's load from ideal.
    pub fn load_ratio(&self, grid: &[StructuredBlock], proc: usize) -> f64 {
        let ideal = self.ideal_load(grid);
        (1.0 - self.proc_load(grid, proc) as f64 / ideal).abs()
    }

    /// Rank carrying the most cells above ideal, and the overload amount.
    pub fn most_overloaded_proc(&self, grid: &[StructuredBlock]) -> (usize, f64) {
        let ideal = self.ideal_load(grid);
        (0..self.num_procs)
            .map(|p| (p, self.proc_load(grid, p) as f64 - ideal))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0))
    }

    /// Rank carrying the most cells below ideal, and the underload amount.
    pub fn most_underloaded_proc(&self, grid: &[StructuredBlock]) -> (usize, f64) {
        let ideal = self.ideal_load(grid);
        (0..self.num_procs)
            .map(|p| (p, ideal - self.proc_load(grid, p) as f64))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0))
    }

    /// Number of blocks currently assigned to one rank.
    pub fn num_blocks_on_proc(&self, proc: usize) -> usize {
        self.rank.iter().filter(|&&r| r == proc).count()
    }

    /// Block counts for every rank.
    pub fn num_blocks_on_all_procs(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_procs];
        for &r in &self.rank {
            counts[r] += 1;
        }
        counts
    }

    /// Reassign a block from one rank to another, keeping local slots
    /// dense on both ranks.
    pub fn send_to_proc(&mut self, block: usize, from: usize, to: usize) {
        let old_pos = self.local_pos[block];
        self.local_pos[block] = self.num_blocks_on_proc(to);
        self.rank[block] = to;
        for b in 0..self.rank.len() {
            if b != block && self.rank[b] == from && self.local_pos[b] > old_pos {
                self.local_pos[b] -= 1;
            }
        }
    }

    /// Record a split of `lower` at face `index` along `axis`. The upper
    /// half becomes a new global block on the same rank, appended to the
    /// end of that rank's local ordering.
    pub fn split(&mut self, lower: usize, index: usize, axis: Axis) {
        let upper = self.rank.len();
        self.split_history.push(SplitRecord {
            lower,
            upper,
            index,
            axis,
        });
        let owner = self.rank[lower];
        self.rank.push(owner);
        self.parent_block.push(self.parent_block[lower]);
        self.local_pos.push(self.num_blocks_on_proc(owner) - 1);
        // num_blocks_on_proc already counts the pushed entry.
    }

    /// Decide what to move from the overloaded rank `send` to the
    /// underloaded rank `recv`.
    ///
    /// A whole-block move is taken when one exists that strictly improves
    /// both ranks' load ratios. Otherwise the largest block on the sender
    /// is split along its longest axis at the face index that minimises
    /// the worse of the two resulting ratios. Returns `None` when the
    /// sender has no block that can be split.
    pub fn send_whole_or_split(
        &self,
        grid: &[StructuredBlock],
        send: usize,
        recv: usize,
    ) -> Option<Transfer> {
        let ideal = self.ideal_load(grid);
        let send_load = self.proc_load(grid, send) as f64;
        let recv_load = self.proc_load(grid, recv) as f64;
        let ratio = |load: f64| (1.0 - load / ideal).abs();
        let send_ratio = ratio(send_load);
        let recv_ratio = ratio(recv_load);

        // Whole-block move if it helps both sides.
        for (b, geom) in grid.iter().enumerate() {
            if self.rank[b] != send {
                continue;
            }
            let cells = geom.num_cells_total() as f64;
            if ratio(send_load - cells) < send_ratio && ratio(recv_load + cells) < recv_ratio {
                return Some(Transfer::Whole { block: b });
            }
        }

        // Largest block on the sender.
        let (block, geom) = grid
            .iter()
            .enumerate()
            .filter(|(b, _)| self.rank[*b] == send)
            .max_by_key(|(_, g)| g.num_cells_total())?;

        // Longest axis, preferring k then j then i on ties.
        let axis = [Axis::K, Axis::J, Axis::I]
            .into_iter()
            .max_by_key(|&a| {
                (
                    geom.num_cells(a),
                    match a {
                        Axis::K => 2,
                        Axis::J => 1,
                        Axis::I => 0,
                    },
                )
            })?;

        let cells = geom.num_cells(axis);
        if cells < 4 {
            return None;
        }
        let plane = geom.num_cells_total() / cells;

        // Lower half moves to the receiver; pick the cut that leaves the
        // worse of the two ratios as small as possible.
        let mut best: Option<(usize, f64)> = None;
        for ii in 2..=cells - 2 {
            let moved = (ii * plane) as f64;
            let worst = ratio(send_load - moved).max(ratio(recv_load + moved));
            if best.map_or(true, |(_, w)| worst < w) {
                best = Some((ii, worst));
            }
        }
        best.map(|(index, _)| Transfer::Split { block, axis, index })
    }

    /// Full decomposition report with per-block cell counts and per-rank
    /// loads. [`Display`](fmt::Display) prints the assignment alone; this
    /// needs the grid for the cell figures.
    pub fn diagnostics(&self, grid: &[StructuredBlock]) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        let _ = writeln!(out, "block  rank  parent  local   cells");
        for b in 0..self.rank.len() {
            let _ = writeln!(
                out,
                "{:>5}  {:>4}  {:>6}  {:>5}  {:>6}",
                b,
                self.rank[b],
                self.parent_block[b],
                self.local_pos[b],
                grid[b].num_cells_total()
            );
        }
        for p in 0..self.num_procs {
            let _ = writeln!(
                out,
                "rank {} load: {} cells over {} blocks",
                p,
                self.proc_load(grid, p),
                self.num_blocks_on_proc(p)
            );
        }
        for s in &self.split_history {
            let _ = writeln!(
                out,
                "split {} -> ({}, {}) at {}={}",
                s.lower, s.lower, s.upper, s.axis, s.index
            );
        }
        out
    }
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block  rank  parent  local")?;
        for b in 0..self.rank.len() {
            writeln!(
                f,
                "{:>5}  {:>4}  {:>6}  {:>5}",
                b, self.rank[b], self.parent_block[b], self.local_pos[b]
            )?;
        }
        for s in &self.split_history {
            writeln!(
                f,
                "split {} -> ({}, {}) at {}={}",
                s.lower, s.lower, s.upper, s.axis, s.index
            )?;
        }
        Ok(())
    }
}
