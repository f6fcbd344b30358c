//! Per-player visibility maps.
//!
//! Vision uses Chebyshev distance: a tile is visible when it lies within
//! `vision` tiles of one of the player's units (per-class radius) or
//! `city_vision_radius` of one of the player's cities.
//!
//! Maps are rebuilt from the registry on every refresh, never patched, so
//! they cannot drift from entity state. The only thing carried over from
//! the previous map is which tiles have ever been seen and which city sites
//! were spotted on them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Coord, PlayerId};
use crate::registry::EntityRegistry;
use crate::terrain::TileGrid;
use crate::units::ClassTable;

/// Visibility of one tile for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Never seen; renders blank.
    Unseen,
    /// Seen before but not now: terrain known, occupants not.
    Seen,
    /// Inside current vision.
    Visible,
}

/// One player's view of the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityMap {
    width: u32,
    height: u32,
    cells: Vec<Visibility>,

    /// Locations of every city the player has ever seen. Owner is not kept.
    known_city_sites: BTreeSet<Coord>,
}

impl VisibilityMap {
    /// A fully unseen map.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Visibility::Unseen; width as usize * height as usize],
            known_city_sites: BTreeSet::new(),
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

    fn index_of(&self, coord: Coord) -> Option<usize> {
        let in_bounds = coord.col >= 0
            && coord.row >= 0
            && (coord.col as u32) < self.width
            && (coord.row as u32) < self.height;
        in_bounds.then(|| coord.row as usize * self.width as usize + coord.col as usize)
    }

    /// Visibility at `coord`. Out-of-bounds tiles are `Unseen`.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Visibility {
        self.index_of(coord)
            .and_then(|i| self.cells.get(i).copied())
            .unwrap_or(Visibility::Unseen)
    }

    #[must_use]
    pub fn is_visible(&self, coord: Coord) -> bool {
        self.get(coord) == Visibility::Visible
    }

    /// Number of tiles in `state`.
    #[must_use]
    pub fn count(&self, state: Visibility) -> usize {
        self.cells.iter().filter(|&&v| v == state).count()
    }

    /// Whether a city site has been spotted at `coord`.
    #[must_use]
    pub fn knows_city_site(&self, coord: Coord) -> bool {
        self.known_city_sites.contains(&coord)
    }

    /// City sites spotted so far.
    pub fn known_city_sites(&self) -> impl Iterator<Item = Coord> + '_ {
        self.known_city_sites.iter().copied()
    }

    /// Whether the map's dimensions match `grid`.
    #[must_use]
    pub fn fits(&self, grid: &TileGrid) -> bool {
        self.width == grid.width()
            && self.height == grid.height()
            && self.cells.len() == grid.area()
    }
}

/// Tiles currently within vision of `player`, as a row-major mask.
#[must_use]
pub fn vision_mask(
    player: PlayerId,
    grid: &TileGrid,
    registry: &EntityRegistry,
    classes: &ClassTable,
    city_vision_radius: u32,
) -> Vec<bool> {
    let mut mask = vec![false; grid.area()];
    let mut mark = |center: Coord, radius: u32| {
        for coord in grid.within(center, radius) {
            if let Some(i) = grid.index_of(coord) {
                mask[i] = true;
            }
        }
    };

    for unit in registry.units_of(player) {
        mark(unit.coord, classes.get(unit.class).vision);
    }
    for city in registry.cities_of(player) {
        mark(city.coord, city_vision_radius);
    }
    mask
}

/// Rebuild `player`'s map from the current registry.
///
/// Tiles in vision become `Visible`; previously visible or seen tiles
/// outside vision become `Seen`; unseen tiles outside vision stay `Unseen`.
/// Calling this twice with no state change in between returns equal maps.
#[must_use]
pub fn refresh(
    previous: &VisibilityMap,
    player: PlayerId,
    grid: &TileGrid,
    registry: &EntityRegistry,
    classes: &ClassTable,
    city_vision_radius: u32,
) -> VisibilityMap {
    let mask = vision_mask(player, grid, registry, classes, city_vision_radius);
    let carried = previous.fits(grid);

    let cells = mask
        .iter()
        .enumerate()
        .map(|(i, &visible)| {
            if visible {
                Visibility::Visible
            } else if carried && previous.cells[i] != Visibility::Unseen {
                Visibility::Seen
            } else {
                Visibility::Unseen
            }
        })
        .collect();

    let mut known_city_sites = if carried {
        previous.known_city_sites.clone()
    } else {
        BTreeSet::new()
    };
    for city in registry.cities() {
        if grid.index_of(city.coord).map_or(false, |i| mask[i]) {
            known_city_sites.insert(city.coord);
        }
    }

    VisibilityMap {
        width: grid.width(),
        height: grid.height(),
        cells,
        known_city_sites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;
    use crate::units::UnitClass;

    fn land_world() -> (TileGrid, EntityRegistry, ClassTable) {
        (
            TileGrid::filled(12, 12, Terrain::Land),
            EntityRegistry::new(),
            ClassTable::default(),
        )
    }

    #[test]
    fn test_unit_vision_radius() {
        let (grid, mut registry, table) = land_world();
        let p0 = PlayerId::new(0);
        registry.create_unit(p0, UnitClass::Army, Coord::new(5, 5), &table.army).unwrap();

        let map = refresh(&VisibilityMap::new(12, 12), p0, &grid, &registry, &table, 3);

        assert!(map.is_visible(Coord::new(7, 7)));
        assert!(!map.is_visible(Coord::new(8, 5)));
        assert_eq!(map.count(Visibility::Visible), 25);
        assert_eq!(map.get(Coord::new(0, 0)), Visibility::Unseen);
    }

    #[test]
    fn test_city_vision_radius() {
        let (grid, mut registry, table) = land_world();
        let p0 = PlayerId::new(0);
        let city = registry.add_city(Coord::new(0, 0));
        registry.set_city_owner(city, Some(p0)).unwrap();

        let map = refresh(&VisibilityMap::new(12, 12), p0, &grid, &registry, &table, 3);

        assert!(map.is_visible(Coord::new(3, 3)));
        assert!(!map.is_visible(Coord::new(4, 0)));
        assert!(map.knows_city_site(Coord::new(0, 0)));
    }

    #[test]
    fn test_leaving_vision_becomes_seen() {
        let (grid, mut registry, table) = land_world();
        let p0 = PlayerId::new(0);
        let id = registry.create_unit(p0, UnitClass::Army, Coord::new(2, 2), &table.army).unwrap();
        let first = refresh(&VisibilityMap::new(12, 12), p0, &grid, &registry, &table, 3);

        registry.relocate_unit(id, Coord::new(9, 9)).unwrap();
        let second = refresh(&first, p0, &grid, &registry, &table, 3);

        assert_eq!(second.get(Coord::new(0, 0)), Visibility::Seen);
        assert_eq!(second.get(Coord::new(9, 9)), Visibility::Visible);
        assert_eq!(second.get(Coord::new(0, 11)), Visibility::Unseen);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let (grid, mut registry, table) = land_world();
        let p0 = PlayerId::new(0);
        registry.create_unit(p0, UnitClass::Fighter, Coord::new(4, 4), &table.fighter).unwrap();

        let once = refresh(&VisibilityMap::new(12, 12), p0, &grid, &registry, &table, 3);
        let twice = refresh(&once, p0, &grid, &registry, &table, 3);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_enemy_units_grant_no_vision() {
        let (grid, mut registry, table) = land_world();
        registry
            .create_unit(PlayerId::new(1), UnitClass::Army, Coord::new(5, 5), &table.army)
            .unwrap();

        let map = refresh(&VisibilityMap::new(12, 12), PlayerId::new(0), &grid, &registry, &table, 3);

        assert_eq!(map.count(Visibility::Visible), 0);
    }
}
