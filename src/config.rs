//! Run configuration and surface input records.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::bc::{BoundaryConditions, BoundarySurface};
use crate::error::MeshDecompError;

/// How blocks are assigned to ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompMethod {
    /// One block per rank, in input order.
    Manual,
    /// Iterative balancing by whole-block moves and splits.
    Cubic,
}

impl FromStr for DecompMethod {
    type Err = MeshDecompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "cubic" => Ok(Self::Cubic),
            other => Err(MeshDecompError::UnknownDecompMethod(other.to_string())),
        }
    }
}

impl fmt::Display for DecompMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Cubic => "cubic",
        })
    }
}

/// Settings the decomposition stage reads from the run input.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub num_procs: usize,
    pub decomp_method: DecompMethod,
}

impl RunConfig {
    pub fn new(num_procs: usize, decomp_method: DecompMethod) -> Self {
        Self {
            num_procs,
            decomp_method,
        }
    }
}

/// One boundary surface as read from the run input, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceRecord {
    pub bc_type: String,
    pub i_min: usize,
    pub i_max: usize,
    pub j_min: usize,
    pub j_max: usize,
    pub k_min: usize,
    pub k_max: usize,
    #[serde(default)]
    pub tag: i32,
}

impl SurfaceRecord {
    pub fn into_surface(self) -> Result<BoundarySurface, MeshDecompError> {
        BoundarySurface::new(
            &self.bc_type,
            [
                [self.i_min, self.i_max],
                [self.j_min, self.j_max],
                [self.k_min, self.k_max],
            ],
            self.tag,
        )
    }
}

/// Validate a block's surface records and assemble its boundary
/// conditions.
pub fn boundary_conditions_from_records(
    records: Vec<SurfaceRecord>,
) -> Result<BoundaryConditions, MeshDecompError> {
    let surfs = records
        .into_iter()
        .map(SurfaceRecord::into_surface)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(BoundaryConditions::new(surfs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_and_displays() {
        assert_eq!("manual".parse::<DecompMethod>().unwrap(), DecompMethod::Manual);
        assert_eq!("cubic".parse::<DecompMethod>().unwrap(), DecompMethod::Cubic);
        assert_eq!(DecompMethod::Cubic.to_string(), "cubic");
        assert!(matches!(
            "graph".parse::<DecompMethod>(),
            Err(MeshDecompError::UnknownDecompMethod(_))
        ));
    }

    #[test]
    fn surface_record_round_trips_through_validation() {
        let rec = SurfaceRecord {
            bc_type: "interblock".into(),
            i_min: 4,
            i_max: 4,
            j_min: 0,
            j_max: 8,
            k_min: 0,
            k_max: 4,
            tag: 3,
        };
        let s = rec.into_surface().unwrap();
        assert!(s.is_connection());
        assert_eq!(s.tag(), 3);
    }

    #[test]
    fn bad_record_is_rejected() {
        let rec = SurfaceRecord {
            bc_type: "slipWall".into(),
            i_min: 0,
            i_max: 4,
            j_min: 0,
            j_max: 8,
            k_min: 0,
            k_max: 4,
            tag: 0,
        };
        assert!(rec.into_surface().is_err());
    }
}
