//! Grid coordinates and Chebyshev geometry.
//!
//! Coordinates are signed so that out-of-bounds requests from callers are
//! representable (and rejected by the grid) instead of wrapping.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A tile position: column (x) and row (y).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub col: i32,
    pub row: i32,
}

/// The eight king-move offsets in fixed ring order: N, NE, E, SE, S, SW, W, NW.
pub const RING_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// The four orthogonal offsets: N, E, S, W.
pub const ORTHOGONAL_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

impl Coord {
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Translate by an offset.
    #[must_use]
    pub const fn offset(self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }

    /// Chebyshev (king-move) distance.
    ///
    /// ```
    /// use rust_empire::core::Coord;
    ///
    /// assert_eq!(Coord::new(0, 0).distance(Coord::new(3, 1)), 3);
    /// ```
    #[must_use]
    pub fn distance(self, other: Coord) -> u32 {
        let dc = (self.col - other.col).unsigned_abs();
        let dr = (self.row - other.row).unsigned_abs();
        dc.max(dr)
    }

    /// The eight surrounding coordinates in ring order. Not bounds-checked.
    #[must_use]
    pub fn ring(self) -> SmallVec<[Coord; 8]> {
        RING_OFFSETS
            .iter()
            .map(|&(dc, dr)| self.offset(dc, dr))
            .collect()
    }

    /// The four orthogonal neighbours. Not bounds-checked.
    #[must_use]
    pub fn orthogonal(self) -> SmallVec<[Coord; 4]> {
        ORTHOGONAL_OFFSETS
            .iter()
            .map(|&(dc, dr)| self.offset(dc, dr))
            .collect()
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_chebyshev() {
        let a = Coord::new(2, 2);

        assert_eq!(a.distance(a), 0);
        assert_eq!(a.distance(Coord::new(3, 3)), 1);
        assert_eq!(a.distance(Coord::new(-1, 4)), 3);
    }

    #[test]
    fn test_ring_order_starts_north_and_turns_clockwise() {
        let ring = Coord::new(5, 5).ring();

        assert_eq!(ring.len(), 8);
        assert_eq!(ring[0], Coord::new(5, 4));
        assert_eq!(ring[2], Coord::new(6, 5));
        assert_eq!(ring[7], Coord::new(4, 4));
        assert!(ring.iter().all(|c| c.distance(Coord::new(5, 5)) == 1));
    }
}
