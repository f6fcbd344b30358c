//! The static tile grid.
//!
//! The grid stores terrain only. Occupants live in the entity registry and
//! are joined in by [`Tile`] views, so the two can never disagree.

use serde::{Deserialize, Serialize};

use crate::core::{CityId, Coord, UnitId};

/// Terrain kind of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Ocean,
    Land,
}

impl Terrain {
    /// Map glyph: '+' for land, '.' for ocean.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Terrain::Ocean => '.',
            Terrain::Land => '+',
        }
    }
}

/// Fixed-size, non-wrapping rectangular grid of terrain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Vec<Terrain>,
}

impl TileGrid {
    /// An all-ocean grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Terrain::Ocean)
    }

    /// A grid with every tile set to `terrain`.
    #[must_use]
    pub fn filled(width: u32, height: u32, terrain: Terrain) -> Self {
        Self {
            width,
            height,
            cells: vec![terrain; width as usize * height as usize],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of tiles.
    #[must_use]
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    /// Whether the stored cells cover exactly `width * height` tiles.
    ///
    /// Always true for grids built here; a deserialized grid may not be.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.width) * u64::from(self.height) == self.cells.len() as u64
    }

    /// Whether `coord` lies inside the grid.
    #[must_use]
    pub fn contains(&self, coord: Coord) -> bool {
        coord.col >= 0
            && coord.row >= 0
            && (coord.col as u32) < self.width
            && (coord.row as u32) < self.height
    }

    /// Row-major cell index, or `None` out of bounds.
    #[must_use]
    pub fn index_of(&self, coord: Coord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.row as usize * self.width as usize + coord.col as usize)
    }

    /// Coordinate of a row-major index.
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Coord {
        let width = self.width.max(1) as usize;
        Coord::new((index % width) as i32, (index / width) as i32)
    }

    /// Terrain at `coord`, or `None` out of bounds.
    #[must_use]
    pub fn terrain(&self, coord: Coord) -> Option<Terrain> {
        self.index_of(coord).and_then(|i| self.cells.get(i).copied())
    }

    /// Set terrain at `coord`. Returns false (and changes nothing) out of bounds.
    pub fn set(&mut self, coord: Coord, terrain: Terrain) -> bool {
        match self.index_of(coord).and_then(|i| self.cells.get_mut(i)) {
            Some(cell) => {
                *cell = terrain;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_land(&self, coord: Coord) -> bool {
        self.terrain(coord) == Some(Terrain::Land)
    }

    /// Number of land tiles.
    #[must_use]
    pub fn land_count(&self) -> usize {
        self.cells.iter().filter(|&&t| t == Terrain::Land).count()
    }

    /// Fraction of tiles that are land.
    #[must_use]
    pub fn land_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.land_count() as f64 / self.cells.len() as f64
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cells.len()).map(move |i| self.coord_of(i))
    }

    /// In-bounds king-move neighbours of `coord`, in ring order.
    pub fn neighbours(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        coord.ring().into_iter().filter(move |c| self.contains(*c))
    }

    /// In-bounds coordinates within Chebyshev `radius` of `center`.
    pub fn within(&self, center: Coord, radius: u32) -> impl Iterator<Item = Coord> + '_ {
        let r = radius.min(i32::MAX as u32) as i32;
        let max_col = self.width as i32 - 1;
        let max_row = self.height as i32 - 1;
        let rows = center.row.saturating_sub(r).max(0)..=center.row.saturating_add(r).min(max_row);
        rows.flat_map(move |row| {
            let cols = center.col.saturating_sub(r).max(0)..=center.col.saturating_add(r).min(max_col);
            cols.map(move |col| Coord::new(col, row))
        })
        .filter(move |c| self.contains(*c))
    }

    /// One string per row of terrain glyphs.
    #[must_use]
    pub fn glyph_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| {
                        self.terrain(Coord::new(col as i32, row as i32))
                            .map_or(' ', Terrain::glyph)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Settled view of one tile: terrain plus occupant back-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub coord: Coord,
    pub terrain: Terrain,
    pub unit: Option<UnitId>,
    pub city: Option<CityId>,
}
