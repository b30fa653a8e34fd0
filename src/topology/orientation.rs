//! Relative orientation of two point-matched patches.
//!
//! A matched pair of rectangular patches can differ in how their local
//! (dir1, dir2) axes line up: identity, either axis reversed, both reversed,
//! and the same four again with the roles of dir1 and dir2 swapped. That is
//! the dihedral group of the square, eight elements, numbered 1..=8.
//!
//! The numbering convention is fixed for wire compatibility:
//!
//! | code | second patch (u', v') in terms of first patch (u, v) |
//! |------|------------------------------------------------------|
//! | 1    | (u, v)            identity                           |
//! | 2    | (1-u, v)          dir1 reversed                      |
//! | 3    | (u, 1-v)          dir2 reversed                      |
//! | 4    | (1-u, 1-v)        both reversed                      |
//! | 5    | (v, u)            axes swapped                       |
//! | 6    | (1-v, u)          swapped, dir1 reversed             |
//! | 7    | (v, 1-u)          swapped, dir2 reversed             |
//! | 8    | (1-v, 1-u)        swapped, both reversed             |
//!
//! Codes 6 and 7 are the two quarter-turns and are each other's inverses;
//! every other element is an involution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two in-plane directions of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InPlaneDir {
    Dir1,
    Dir2,
}

/// Orientation code in 1..=8 mapping the first patch's local axes onto the
/// second patch's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    Identity = 1,
    Dir1Reversed = 2,
    Dir2Reversed = 3,
    BothReversed = 4,
    Swapped = 5,
    SwappedDir1Reversed = 6,
    SwappedDir2Reversed = 7,
    SwappedBothReversed = 8,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Identity,
        Orientation::Dir1Reversed,
        Orientation::Dir2Reversed,
        Orientation::BothReversed,
        Orientation::Swapped,
        Orientation::SwappedDir1Reversed,
        Orientation::SwappedDir2Reversed,
        Orientation::SwappedBothReversed,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Orientation> {
        Orientation::ALL.into_iter().find(|o| o.code() == code)
    }

    /// Whether dir1 and dir2 swap roles across the match.
    #[inline]
    pub fn is_swapped(self) -> bool {
        self.code() >= 5
    }

    /// The orientation seen from the second patch's side.
    #[inline]
    pub fn inverse(self) -> Orientation {
        match self {
            Orientation::SwappedDir1Reversed => Orientation::SwappedDir2Reversed,
            Orientation::SwappedDir2Reversed => Orientation::SwappedDir1Reversed,
            other => other,
        }
    }

    /// Where a line of constant `dir` coordinate on the first patch lands on
    /// the second patch: the in-plane direction it becomes, and whether the
    /// coordinate runs reversed.
    pub fn image_of(self, dir: InPlaneDir) -> (InPlaneDir, bool) {
        use InPlaneDir::*;
        use Orientation::*;
        match (self, dir) {
            (Identity, d) => (d, false),
            (Dir1Reversed, Dir1) => (Dir1, true),
            (Dir1Reversed, Dir2) => (Dir2, false),
            (Dir2Reversed, Dir1) => (Dir1, false),
            (Dir2Reversed, Dir2) => (Dir2, true),
            (BothReversed, d) => (d, true),
            (Swapped, Dir1) => (Dir2, false),
            (Swapped, Dir2) => (Dir1, false),
            // (u,v) -> (1-v, u): a u=c line becomes v'=c; a v=c line becomes u'=1-c.
            (SwappedDir1Reversed, Dir1) => (Dir2, false),
            (SwappedDir1Reversed, Dir2) => (Dir1, true),
            // (u,v) -> (v, 1-u): a u=c line becomes v'=1-c; a v=c line becomes u'=c.
            (SwappedDir2Reversed, Dir1) => (Dir2, true),
            (SwappedDir2Reversed, Dir2) => (Dir1, false),
            (SwappedBothReversed, Dir1) => (Dir2, true),
            (SwappedBothReversed, Dir2) => (Dir1, true),
        }
    }

    /// Apply the mapping to normalized in-plane coordinates of the first
    /// patch, yielding coordinates on the second.
    pub fn apply(self, u: f64, v: f64) -> (f64, f64) {
        use Orientation::*;
        match self {
            Identity => (u, v),
            Dir1Reversed => (1.0 - u, v),
            Dir2Reversed => (u, 1.0 - v),
            BothReversed => (1.0 - u, 1.0 - v),
            Swapped => (v, u),
            SwappedDir1Reversed => (1.0 - v, u),
            SwappedDir2Reversed => (v, 1.0 - u),
            SwappedBothReversed => (1.0 - v, 1.0 - u),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_round_trips_coordinates() {
        for o in Orientation::ALL {
            for (u, v) in [(0.0, 0.0), (1.0, 0.0), (0.25, 0.75)] {
                let (u2, v2) = o.apply(u, v);
                let (u3, v3) = o.inverse().apply(u2, v2);
                assert!((u3 - u).abs() < 1e-15 && (v3 - v).abs() < 1e-15, "code {o}");
            }
        }
    }

    #[test]
    fn image_matches_apply() {
        // A u=c line on the first patch maps onto the direction/orientation
        // reported by image_of.
        for o in Orientation::ALL {
            let (dir, reversed) = o.image_of(InPlaneDir::Dir1);
            let c = 0.25;
            let (u2, v2) = o.apply(c, 0.5);
            let coord = match dir {
                InPlaneDir::Dir1 => u2,
                InPlaneDir::Dir2 => v2,
            };
            let expect = if reversed { 1.0 - c } else { c };
            assert!((coord - expect).abs() < 1e-15, "code {o}");
        }
    }

    #[test]
    fn code_round_trip() {
        for o in Orientation::ALL {
            assert_eq!(Orientation::from_code(o.code()), Some(o));
        }
        assert_eq!(Orientation::from_code(0), None);
        assert_eq!(Orientation::from_code(9), None);
    }
}
