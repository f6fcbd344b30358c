//! What one player can see, detached from the engine.
//!
//! A view is built between commands and owns its data, so renderers and
//! commanders can hold it while the engine moves on. Enemy units and cities
//! appear only on currently visible tiles; previously seen tiles keep their
//! terrain and, for city sites, a bare location with no owner.

use serde::{Deserialize, Serialize};

use crate::core::{CityId, Coord, PlayerId, UnitId};
use crate::fog::{Visibility, VisibilityMap};
use crate::terrain::Terrain;
use crate::turn::{Engine, GameResult, Mode};
use crate::units::{Domain, UnitClass};

/// A unit on a visible tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSighting {
    pub id: UnitId,
    pub owner: PlayerId,
    pub class: UnitClass,

    /// Terrain the class may stand on, from the class table.
    pub domain: Domain,

    pub coord: Coord,

    /// Movement left; reported for the viewer's own units only.
    pub moves_left: Option<u32>,

    /// Fuel left for the viewer's own fuel-limited units.
    pub fuel: Option<u32>,
}

/// A city on a visible tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySighting {
    pub id: CityId,
    pub owner: Option<PlayerId>,
    pub coord: Coord,

    /// Current order; reported for the viewer's own cities only.
    pub production: Option<UnitClass>,
}

/// Read-only per-player snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player: PlayerId,
    pub active: PlayerId,
    pub width: u32,
    pub height: u32,
    pub turn: u32,

    /// The viewer's mode; `None` unless the viewer is the active player.
    pub mode: Option<Mode>,

    pub result: Option<GameResult>,
    pub units: Vec<UnitSighting>,
    pub cities: Vec<CitySighting>,

    /// City sites on previously seen tiles, without owner.
    pub remembered_cities: Vec<Coord>,

    visibility: Vec<Visibility>,
    terrain: Vec<Option<Terrain>>,
}

impl PlayerView {
    pub(crate) fn build(engine: &Engine, player: PlayerId) -> Self {
        let grid = engine.grid();
        let registry = engine.registry();
        let fallback;
        let fog = match engine.visibility(player) {
            Some(map) => map,
            None => {
                fallback = VisibilityMap::new(grid.width(), grid.height());
                &fallback
            }
        };

        let mut visibility = Vec::with_capacity(grid.area());
        let mut terrain = Vec::with_capacity(grid.area());
        for coord in grid.coords() {
            let state = fog.get(coord);
            visibility.push(state);
            terrain.push(match state {
                Visibility::Unseen => None,
                _ => grid.terrain(coord),
            });
        }

        let units = registry
            .units()
            .filter(|u| fog.is_visible(u.coord))
            .map(|u| UnitSighting {
                id: u.id,
                owner: u.owner,
                class: u.class,
                domain: engine.config().units.get(u.class).domain,
                coord: u.coord,
                moves_left: (u.owner == player).then_some(u.moves_left),
                fuel: u.fuel.filter(|_| u.owner == player),
            })
            .collect();
        let cities = registry
            .cities()
            .filter(|c| fog.is_visible(c.coord))
            .map(|c| CitySighting {
                id: c.id,
                owner: c.owner,
                coord: c.coord,
                production: if c.is_owned_by(player) { c.production } else { None },
            })
            .collect();
        let remembered_cities = fog
            .known_city_sites()
            .filter(|&coord| !fog.is_visible(coord))
            .collect();

        let active = engine.active_player();
        Self {
            player,
            active,
            width: grid.width(),
            height: grid.height(),
            turn: engine.turn_number(),
            mode: (active == player).then(|| engine.mode()),
            result: engine.result(),
            units,
            cities,
            remembered_cities,
            visibility,
            terrain,
        }
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        let in_bounds = coord.col >= 0
            && coord.row >= 0
            && (coord.col as u32) < self.width
            && (coord.row as u32) < self.height;
        in_bounds.then(|| coord.row as usize * self.width as usize + coord.col as usize)
    }

    #[must_use]
    pub fn visibility(&self, coord: Coord) -> Visibility {
        self.index_of(coord)
            .map_or(Visibility::Unseen, |i| self.visibility[i])
    }

    /// Terrain of a tile the viewer has ever seen.
    #[must_use]
    pub fn terrain(&self, coord: Coord) -> Option<Terrain> {
        self.index_of(coord).and_then(|i| self.terrain[i])
    }

    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        self.active == self.player && self.result.is_none()
    }

    #[must_use]
    pub fn unit_at(&self, coord: Coord) -> Option<&UnitSighting> {
        self.units.iter().find(|u| u.coord == coord)
    }

    #[must_use]
    pub fn city_at(&self, coord: Coord) -> Option<&CitySighting> {
        self.cities.iter().find(|c| c.coord == coord)
    }

    pub fn own_units(&self) -> impl Iterator<Item = &UnitSighting> {
        self.units.iter().filter(move |u| u.owner == self.player)
    }

    pub fn own_cities(&self) -> impl Iterator<Item = &CitySighting> {
        self.cities
            .iter()
            .filter(move |c| c.owner == Some(self.player))
    }

    /// One string per row in the classic glyph set.
    ///
    /// `' '` unseen, `'+'` land, `'.'` ocean, `'O'` own city, `'X'` enemy
    /// city, `'o'` neutral or remembered city. Units show their class glyph,
    /// uppercase for the viewer's own and lowercase for everyone else's.
    #[must_use]
    pub fn glyph_rows(&self) -> Vec<String> {
        let mut rows: Vec<Vec<char>> = (0..self.height)
            .map(|row| {
                (0..self.width)
                    .map(|col| self.terrain(Coord::new(col as i32, row as i32)).map_or(' ', Terrain::glyph))
                    .collect()
            })
            .collect();
        let mut put = |coord: Coord, glyph: char| {
            if let Some(cell) = rows
                .get_mut(coord.row as usize)
                .and_then(|row| row.get_mut(coord.col as usize))
            {
                *cell = glyph;
            }
        };

        for &coord in &self.remembered_cities {
            put(coord, 'o');
        }
        for city in &self.cities {
            let glyph = match city.owner {
                Some(owner) if owner == self.player => 'O',
                Some(_) => 'X',
                None => 'o',
            };
            put(city.coord, glyph);
        }
        for unit in &self.units {
            let glyph = unit.class.glyph();
            put(
                unit.coord,
                if unit.owner == self.player { glyph } else { glyph.to_ascii_lowercase() },
            );
        }

        rows.into_iter().map(|row| row.into_iter().collect()).collect()
    }
}
