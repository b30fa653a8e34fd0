//! Decomposition strategies.
//!
//! `manual` maps block `i` to rank `i` and requires one block per rank.
//! `cubic` iteratively moves or splits blocks from the most overloaded
//! rank to the most underloaded one until every rank is within 10% of the
//! ideal cell count, or the iteration budget runs out.

use std::fmt;

use log::{info, warn};

use crate::bc::BoundaryConditions;
use crate::config::{DecompMethod, RunConfig};
use crate::error::MeshDecompError;
use crate::geometry::StructuredBlock;

use super::{Decomposition, Transfer};

/// Acceptable deviation of the heaviest rank from the ideal load.
const LOAD_TOLERANCE: f64 = 1.1;

/// Per-rank load summary, printed after balancing.
#[derive(Debug, Clone, Copy)]
pub struct LoadStats {
    pub ideal: f64,
    pub max: usize,
    pub min: usize,
    pub most_overloaded: (usize, f64),
    pub most_underloaded: (usize, f64),
}

impl LoadStats {
    pub fn new(decomp: &Decomposition, grid: &[StructuredBlock]) -> Self {
        Self {
            ideal: decomp.ideal_load(grid),
            max: decomp.max_load(grid),
            min: decomp.min_load(grid),
            most_overloaded: decomp.most_overloaded_proc(grid),
            most_underloaded: decomp.most_underloaded_proc(grid),
        }
    }

    /// Heaviest load relative to ideal.
    pub fn imbalance(&self) -> f64 {
        self.max as f64 / self.ideal
    }
}

impl fmt::Display for LoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ideal load: {:.1} cells", self.ideal)?;
        writeln!(f, "max load:   {} cells", self.max)?;
        writeln!(f, "min load:   {} cells", self.min)?;
        writeln!(
            f,
            "rank {} is {:.1} cells over ideal",
            self.most_overloaded.0, self.most_overloaded.1
        )?;
        writeln!(
            f,
            "rank {} is {:.1} cells under ideal",
            self.most_underloaded.0, self.most_underloaded.1
        )?;
        write!(f, "imbalance: {:.3}", self.imbalance())
    }
}

/// Dispatch on the configured method.
pub fn decompose(
    grid: &mut Vec<StructuredBlock>,
    bcs: &mut Vec<BoundaryConditions>,
    config: &RunConfig,
) -> Result<Decomposition, MeshDecompError> {
    match config.decomp_method {
        DecompMethod::Manual => manual_decomposition(grid, bcs, config.num_procs),
        DecompMethod::Cubic => cubic_decomposition(grid, bcs, config.num_procs),
    }
}

/// One block per rank, in input order.
pub fn manual_decomposition(
    grid: &[StructuredBlock],
    _bcs: &[BoundaryConditions],
    num_procs: usize,
) -> Result<Decomposition, MeshDecompError> {
    if grid.len() != num_procs {
        return Err(MeshDecompError::BlockCountMismatch {
            blocks: grid.len(),
            procs: num_procs,
        });
    }
    let mut decomp = Decomposition::new(grid.len(), num_procs);
    for b in 1..grid.len() {
        decomp.send_to_proc(b, 0, b);
    }
    info!("manual decomposition of {} blocks", grid.len());
    Ok(decomp)
}

/// Greedy load balancing by whole-block moves and axis-aligned splits.
///
/// Splitting a block rewrites its boundary conditions and, through the
/// returned spanning surfaces, the boundary conditions of every block it
/// connects to across the cut. New blocks are appended to `grid` and
/// `bcs`; the split history is kept in the returned [`Decomposition`].
pub fn cubic_decomposition(
    grid: &mut Vec<StructuredBlock>,
    bcs: &mut Vec<BoundaryConditions>,
    num_procs: usize,
) -> Result<Decomposition, MeshDecompError> {
    let mut decomp = Decomposition::new(grid.len(), num_procs);
    let mut next_tag = next_free_tag(bcs);
    let max_iterations = 10 * num_procs;

    let mut iterations = 0;
    while decomp.max_load(grid) as f64 / decomp.ideal_load(grid) > LOAD_TOLERANCE {
        if iterations >= max_iterations {
            warn!(
                "load balancing stopped after {} iterations at imbalance {:.3}",
                iterations,
                decomp.max_load(grid) as f64 / decomp.ideal_load(grid)
            );
            break;
        }
        iterations += 1;

        let (overloaded, _) = decomp.most_overloaded_proc(grid);
        let (underloaded, _) = decomp.most_underloaded_proc(grid);

        match decomp.send_whole_or_split(grid, overloaded, underloaded) {
            Some(Transfer::Whole { block }) => {
                info!(
                    "moving block {} from rank {} to rank {}",
                    block, overloaded, underloaded
                );
                decomp.send_to_proc(block, overloaded, underloaded);
            }
            Some(Transfer::Split { block, axis, index }) => {
                info!(
                    "splitting block {} at {}={}, lower half to rank {}",
                    block, axis, index, underloaded
                );
                split_block(grid, bcs, &mut decomp, block, axis, index, &mut next_tag)?;
                decomp.send_to_proc(block, overloaded, underloaded);
            }
            None => {
                warn!(
                    "rank {} has no block that can be moved or split",
                    overloaded
                );
                break;
            }
        }
    }

    info!("load balance after {} iterations", iterations);
    info!("{}", LoadStats::new(&decomp, grid));
    Ok(decomp)
}

/// Split one block in place and patch up every connected block's
/// boundary conditions.
fn split_block(
    grid: &mut Vec<StructuredBlock>,
    bcs: &mut Vec<BoundaryConditions>,
    decomp: &mut Decomposition,
    block: usize,
    axis: crate::geometry::Axis,
    index: usize,
    next_tag: &mut i32,
) -> Result<(), MeshDecompError> {
    let new_block = grid.len();
    let pre_geom = grid[block].clone();
    let (lower, upper) = pre_geom.split_at(axis, index)?;

    let seam_tag = *next_tag;
    *next_tag += 1;
    let (upper_bc, spanning) = bcs[block].split(axis, index, seam_tag)?;

    grid[block] = lower;
    grid.push(upper);
    bcs.push(upper_bc);
    decomp.split(block, index, axis);

    // Every connection that crossed the cut forces a matching split of
    // the partner block's surface. A tag can live on several blocks once
    // earlier splits have tiled a seam, so candidates are tried until one
    // actually corner-matches the spanning surface.
    for surf in &spanning {
        let mut matched = false;
        for partner in (0..bcs.len()).filter(|&b| b != block && b != new_block) {
            if !bcs[partner]
                .surfaces()
                .any(|s| s.is_connection() && s.tag() == surf.tag())
            {
                continue;
            }
            let partner_geom = grid[partner].clone();
            match bcs[partner].dependent_split(surf, &pre_geom, &partner_geom, partner, axis, index)
            {
                Ok(()) => {
                    matched = true;
                    break;
                }
                Err(MeshDecompError::UnmatchedPatch { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        if !matched {
            return Err(MeshDecompError::UnmatchedPatch {
                block,
                tag: surf.tag(),
            });
        }
    }
    Ok(())
}

fn next_free_tag(bcs: &[BoundaryConditions]) -> i32 {
    bcs.iter()
        .flat_map(BoundaryConditions::surfaces)
        .map(|s| s.tag())
        .max()
        .map_or(1, |t| t + 1)
}
