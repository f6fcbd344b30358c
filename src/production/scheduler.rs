//! City production.
//!
//! Each end of turn, every city of the ending player with an order gains one
//! point of progress. A city whose progress reaches the class build cost
//! spawns one unit and restarts at zero. The unit goes on the city tile if
//! its domain allows and the tile is free, otherwise on the first free
//! legal tile of the surrounding ring (N, NE, E, SE, S, SW, W, NW). When no
//! tile is free the finished unit is held at full progress and placement is
//! retried on the next end of turn.

use tracing::debug;

use crate::core::{CityId, CommandError, Coord, PlayerId, RejectReason, UnitId};
use crate::registry::EntityRegistry;
use crate::terrain::TileGrid;
use crate::units::{ClassTable, UnitClass};

/// What one production tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductionReport {
    /// Units created this tick with their source city.
    pub spawned: Vec<(CityId, UnitId)>,

    /// Cities holding a finished unit with nowhere to put it.
    pub held: Vec<CityId>,
}

/// Give `city_id` a new order on behalf of `player`.
pub fn set_production(
    registry: &mut EntityRegistry,
    classes: &ClassTable,
    player: PlayerId,
    city_id: CityId,
    class: Option<UnitClass>,
) -> Result<(), CommandError> {
    let city = registry.try_city(city_id)?;
    if !city.is_owned_by(player) {
        return Err(RejectReason::NotOwned.into());
    }
    let order = match class {
        Some(class) => {
            let stats = classes.get(class);
            if !stats.buildable {
                return Err(RejectReason::ClassUnavailable.into());
            }
            Some((class, stats.build_cost))
        }
        None => None,
    };
    registry.set_city_production(city_id, order)
}

/// First legal free tile for a new `class` unit from the city at `origin`.
#[must_use]
pub fn spawn_site(
    grid: &TileGrid,
    registry: &EntityRegistry,
    classes: &ClassTable,
    owner: PlayerId,
    origin: Coord,
    class: UnitClass,
) -> Option<Coord> {
    let domain = classes.get(class).domain;
    std::iter::once(origin)
        .chain(grid.neighbours(origin))
        .find(|&coord| {
            grid.terrain(coord).map_or(false, |t| domain.permits(t))
                && registry.unit_at(coord).is_none()
                && registry.city_at(coord).map_or(true, |c| c.is_owned_by(owner))
        })
}

/// Advance every producing city of `player` by one turn.
pub fn advance_turn(
    registry: &mut EntityRegistry,
    grid: &TileGrid,
    classes: &ClassTable,
    player: PlayerId,
) -> Result<ProductionReport, CommandError> {
    let mut report = ProductionReport::default();
    let producing: Vec<(CityId, Coord, UnitClass)> = registry
        .cities_of(player)
        .filter_map(|c| c.production.map(|class| (c.id, c.coord, class)))
        .collect();

    for (city_id, coord, class) in producing {
        let progress = registry.advance_city_progress(city_id)?;
        let cost = registry.try_city(city_id)?.cost;
        if progress < cost {
            continue;
        }

        match spawn_site(grid, registry, classes, player, coord, class) {
            Some(site) => {
                let unit = registry.create_unit(player, class, site, classes.get(class))?;
                registry.reset_city_progress(city_id)?;
                debug!(city = %city_id, unit = %unit, %class, at = %site, "unit produced");
                report.spawned.push((city_id, unit));
            }
            None => {
                debug!(city = %city_id, %class, "production held, no free tile");
                report.held.push(city_id);
            }
        }
    }
    Ok(report)
}
