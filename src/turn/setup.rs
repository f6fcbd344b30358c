//! Game setup: seating players on a generated world, and hand-built worlds.

use std::cmp::Reverse;

use im::Vector;
use tracing::warn;

use super::engine::Engine;
use super::state::TurnState;
use crate::core::{CityId, Coord, EngineConfig, GameRng, PlayerId, SetupError};
use crate::production;
use crate::registry::EntityRegistry;
use crate::terrain::{Terrain, TileGrid};
use crate::units::UnitClass;

/// Pick one home city per player.
///
/// Player 1 takes the lowest city id. Each following player takes the free
/// city whose distance to the nearest already-assigned home is largest,
/// ties going to the lower id.
pub(crate) fn assign_homes(registry: &EntityRegistry, players: usize) -> Result<Vec<CityId>, SetupError> {
    let sites: Vec<(CityId, Coord)> = registry.cities().map(|c| (c.id, c.coord)).collect();
    if sites.len() < players {
        return Err(SetupError::InvalidScenario(format!(
            "{} cities for {} players",
            sites.len(),
            players
        )));
    }

    let mut homes: Vec<(CityId, Coord)> = sites.iter().copied().take(1).collect();
    while homes.len() < players {
        let next = sites
            .iter()
            .filter(|site| !homes.contains(*site))
            .max_by_key(|(id, coord)| {
                let spread = homes.iter().map(|(_, home)| home.distance(*coord)).min().unwrap_or(0);
                (spread, Reverse(*id))
            })
            .copied();
        match next {
            Some(site) => homes.push(site),
            None => break,
        }
    }
    Ok(homes.into_iter().map(|(id, _)| id).collect())
}

/// Give `player` their home city, its first order and starting units.
pub(crate) fn seat_player(
    registry: &mut EntityRegistry,
    grid: &TileGrid,
    config: &EngineConfig,
    player: PlayerId,
    home: CityId,
) -> Result<(), SetupError> {
    registry.set_city_owner(home, Some(player)).map_err(scenario)?;
    if let Some(class) = config.setup.default_production {
        production::set_production(registry, &config.units, player, home, Some(class)).map_err(scenario)?;
    }

    let origin = registry.try_city(home).map_err(scenario)?.coord;
    for &class in &config.setup.starting_units {
        match production::spawn_site(grid, registry, &config.units, player, origin, class) {
            Some(site) => {
                registry
                    .create_unit(player, class, site, config.units.get(class))
                    .map_err(scenario)?;
            }
            None => warn!(%player, %class, city = %home, "no room for starting unit"),
        }
    }
    Ok(())
}

fn scenario(err: impl std::fmt::Display) -> SetupError {
    SetupError::InvalidScenario(err.to_string())
}

struct CityPlan {
    coord: Coord,
    owner: Option<PlayerId>,
    production: Option<UnitClass>,
}

/// Builder for hand-authored worlds.
///
/// Starts from an all-ocean grid of the configured size. Nothing from
/// `config.setup` is applied: the world holds exactly the cities and units
/// declared here.
///
/// ```
/// use rust_empire::core::{Coord, EngineConfig, PlayerId};
/// use rust_empire::terrain::Terrain;
/// use rust_empire::turn::WorldBuilder;
/// use rust_empire::units::UnitClass;
///
/// let engine = WorldBuilder::new(EngineConfig::default().with_grid(10, 10))
///     .filled(Terrain::Land)
///     .city(Coord::new(2, 2), Some(PlayerId::new(0)))
///     .producing(UnitClass::Army)
///     .city(Coord::new(7, 7), Some(PlayerId::new(1)))
///     .unit(PlayerId::new(0), UnitClass::Army, Coord::new(2, 2))
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.registry().city_count(), 2);
/// ```
pub struct WorldBuilder {
    config: EngineConfig,
    grid: TileGrid,
    cities: Vec<CityPlan>,
    units: Vec<(PlayerId, UnitClass, Coord)>,
}

impl WorldBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let grid = TileGrid::new(config.map.width, config.map.height);
        Self {
            config,
            grid,
            cities: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Replace the grid. The config's map size follows it.
    #[must_use]
    pub fn with_grid(mut self, grid: TileGrid) -> Self {
        self.config.map.width = grid.width();
        self.config.map.height = grid.height();
        self.grid = grid;
        self
    }

    /// Set every tile to `terrain`.
    #[must_use]
    pub fn filled(mut self, terrain: Terrain) -> Self {
        self.grid = TileGrid::filled(self.grid.width(), self.grid.height(), terrain);
        self
    }

    /// Set one tile. Out-of-bounds coordinates are ignored.
    #[must_use]
    pub fn paint(mut self, coord: Coord, terrain: Terrain) -> Self {
        self.grid.set(coord, terrain);
        self
    }

    /// Set the inclusive rectangle between two corners.
    #[must_use]
    pub fn paint_rect(mut self, a: Coord, b: Coord, terrain: Terrain) -> Self {
        for row in a.row.min(b.row)..=a.row.max(b.row) {
            for col in a.col.min(b.col)..=a.col.max(b.col) {
                self.grid.set(Coord::new(col, row), terrain);
            }
        }
        self
    }

    /// Add a city; `None` makes it neutral.
    #[must_use]
    pub fn city(mut self, coord: Coord, owner: Option<PlayerId>) -> Self {
        self.cities.push(CityPlan {
            coord,
            owner,
            production: None,
        });
        self
    }

    /// Give the most recently added city a production order.
    #[must_use]
    pub fn producing(mut self, class: UnitClass) -> Self {
        if let Some(plan) = self.cities.last_mut() {
            plan.production = Some(class);
        }
        self
    }

    #[must_use]
    pub fn unit(mut self, owner: PlayerId, class: UnitClass, coord: Coord) -> Self {
        self.units.push((owner, class, coord));
        self
    }

    /// Validate the declared world and start the game.
    pub fn build(self) -> Result<Engine, SetupError> {
        self.config.validate()?;
        let players = self.config.players;
        let mut registry = EntityRegistry::new();

        for plan in &self.cities {
            if !self.grid.is_land(plan.coord) {
                return Err(SetupError::InvalidScenario(format!("city at {} is not on land", plan.coord)));
            }
            if registry.city_at(plan.coord).is_some() {
                return Err(SetupError::InvalidScenario(format!("two cities at {}", plan.coord)));
            }
            if plan.owner.map_or(false, |owner| owner.index() >= players) {
                return Err(SetupError::InvalidScenario(format!("city at {} has no such owner", plan.coord)));
            }
            let id = registry.add_city(plan.coord);
            registry.set_city_owner(id, plan.owner).map_err(scenario)?;
            if let Some(class) = plan.production {
                let cost = self.config.units.get(class).build_cost;
                registry.set_city_production(id, Some((class, cost))).map_err(scenario)?;
            }
        }

        for &(owner, class, coord) in &self.units {
            let stats = self.config.units.get(class);
            let legal = self.grid.terrain(coord).map_or(false, |t| stats.domain.permits(t));
            if !legal {
                return Err(SetupError::InvalidScenario(format!("{class} cannot stand at {coord}")));
            }
            if registry.city_at(coord).map_or(false, |c| !c.is_owned_by(owner)) {
                return Err(SetupError::InvalidScenario(format!("{class} at {coord} stands in a foreign city")));
            }
            registry.create_unit(owner, class, coord, stats).map_err(scenario)?;
        }

        registry
            .validate(&self.grid, &self.config.units, players)
            .map_err(SetupError::InvalidScenario)?;

        let rng = GameRng::new(self.config.seed);
        let turn = TurnState::new(players);
        Ok(Engine::from_parts(self.config, self.grid, registry, rng, turn, Vector::new(), None))
    }
}
