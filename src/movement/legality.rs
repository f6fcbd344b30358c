//! Move validation and classification.
//!
//! `propose_move` checks a requested destination, in order:
//!
//! 1. the destination is not the unit's own tile, and lies inside the grid
//! 2. the destination terrain is permitted for the unit's domain
//! 3. a legal path exists and its cost fits the remaining movement points
//! 4. the destination does not hold a friendly unit
//!
//! and then classifies the move as a plain relocation, a city capture or an
//! engagement. Nothing is mutated; [`apply`] performs the movement part of
//! an accepted outcome.
//!
//! ## Path cost
//!
//! Cost is the length of the shortest 8-connected path (one point per
//! step). Intermediate tiles must be passable for the unit's domain, may
//! hold friendly units, and may not hold enemy units or non-friendly
//! cities. For an engagement the attacker stops on the last tile before the
//! defender, which must be empty unless it is the unit's starting tile.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::core::{CityId, CommandError, Coord, PlayerId, RejectReason, UnitId};
use crate::registry::EntityRegistry;
use crate::terrain::TileGrid;
use crate::units::{ClassTable, Domain, Unit};

/// Classified result of a legal move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Relocate to an empty tile (or a friendly city).
    Move {
        unit: UnitId,
        from: Coord,
        to: Coord,
        cost: u32,
    },
    /// Enter an undefended enemy or neutral city; ownership transfers.
    Capture {
        unit: UnitId,
        city: CityId,
        previous_owner: Option<PlayerId>,
        from: Coord,
        to: Coord,
        cost: u32,
    },
    /// Attack the enemy unit on `target` from `staging`.
    Engage {
        attacker: UnitId,
        defender: UnitId,
        from: Coord,
        staging: Coord,
        target: Coord,
        cost: u32,
    },
}

impl MoveOutcome {
    /// Movement points the outcome consumes.
    #[must_use]
    pub fn cost(&self) -> u32 {
        match *self {
            MoveOutcome::Move { cost, .. }
            | MoveOutcome::Capture { cost, .. }
            | MoveOutcome::Engage { cost, .. } => cost,
        }
    }

    /// The moving unit.
    #[must_use]
    pub fn unit(&self) -> UnitId {
        match *self {
            MoveOutcome::Move { unit, .. } | MoveOutcome::Capture { unit, .. } => unit,
            MoveOutcome::Engage { attacker, .. } => attacker,
        }
    }
}

/// Validate and classify a move of `unit_id` to `destination`.
pub fn propose_move(
    grid: &TileGrid,
    registry: &EntityRegistry,
    classes: &ClassTable,
    unit_id: UnitId,
    destination: Coord,
) -> Result<MoveOutcome, CommandError> {
    let unit = registry.try_unit(unit_id)?;
    let from = unit.coord;
    let domain = classes.get(unit.class).domain;

    if destination == from {
        return Err(RejectReason::SameTile.into());
    }
    let Some(terrain) = grid.terrain(destination) else {
        return Err(RejectReason::OutOfBounds.into());
    };
    if !domain.permits(terrain) {
        return Err(RejectReason::WrongTerrain.into());
    }

    let occupant = registry.unit_at(destination);
    let engaging = occupant.map_or(false, |o| o.owner != unit.owner);
    let distances = path_distances(grid, registry, unit, domain);
    let (staging, cost) =
        cheapest_approach(grid, registry, &distances, from, destination, engaging)
            .ok_or(CommandError::Illegal(RejectReason::Unreachable))?;
    if cost > unit.moves_left {
        return Err(RejectReason::InsufficientMovement.into());
    }

    if let Some(occupant) = occupant {
        if occupant.owner == unit.owner {
            return Err(RejectReason::FriendlyOccupied.into());
        }
        return Ok(MoveOutcome::Engage {
            attacker: unit.id,
            defender: occupant.id,
            from,
            staging,
            target: destination,
            cost,
        });
    }

    if let Some(city) = registry.city_at(destination) {
        if !city.is_owned_by(unit.owner) {
            if domain != Domain::Land {
                return Err(RejectReason::CannotCapture.into());
            }
            return Ok(MoveOutcome::Capture {
                unit: unit.id,
                city: city.id,
                previous_owner: city.owner,
                from,
                to: destination,
                cost,
            });
        }
    }

    Ok(MoveOutcome::Move {
        unit: unit.id,
        from,
        to: destination,
        cost,
    })
}

/// Whether `unit` may pass through `coord` on the way somewhere else.
fn is_transit(grid: &TileGrid, registry: &EntityRegistry, unit: &Unit, domain: Domain, coord: Coord) -> bool {
    let Some(terrain) = grid.terrain(coord) else {
        return false;
    };
    if !domain.permits(terrain) {
        return false;
    }
    if registry.unit_at(coord).map_or(false, |o| o.owner != unit.owner) {
        return false;
    }
    registry.city_at(coord).map_or(true, |c| c.is_owned_by(unit.owner))
}

/// Breadth-first step counts from the unit's tile over transit tiles.
fn path_distances(
    grid: &TileGrid,
    registry: &EntityRegistry,
    unit: &Unit,
    domain: Domain,
) -> FxHashMap<Coord, u32> {
    let mut distances = FxHashMap::default();
    let mut queue = VecDeque::new();
    distances.insert(unit.coord, 0);
    queue.push_back(unit.coord);

    while let Some(current) = queue.pop_front() {
        let next_distance = distances[&current] + 1;
        for neighbour in grid.neighbours(current) {
            if distances.contains_key(&neighbour)
                || !is_transit(grid, registry, unit, domain, neighbour)
            {
                continue;
            }
            distances.insert(neighbour, next_distance);
            queue.push_back(neighbour);
        }
    }
    distances
}

/// Cheapest (last transit tile, total cost) for reaching `destination`.
///
/// When engaging, the last tile is where the attacker halts, so it must be
/// empty or the starting tile. Ties resolve to the first tile in ring order.
fn cheapest_approach(
    grid: &TileGrid,
    registry: &EntityRegistry,
    distances: &FxHashMap<Coord, u32>,
    from: Coord,
    destination: Coord,
    engaging: bool,
) -> Option<(Coord, u32)> {
    let mut best: Option<(Coord, u32)> = None;
    for neighbour in grid.neighbours(destination) {
        let Some(&distance) = distances.get(&neighbour) else {
            continue;
        };
        if engaging && neighbour != from && registry.unit_at(neighbour).is_some() {
            continue;
        }
        if best.map_or(true, |(_, cost)| distance + 1 < cost) {
            best = Some((neighbour, distance + 1));
        }
    }
    best
}

/// Apply the movement part of an accepted outcome.
///
/// `Move` relocates, `Capture` relocates and transfers the city, `Engage`
/// moves the attacker to its staging tile. All three debit the full cost.
/// Combat for an engagement is resolved separately.
pub fn apply(registry: &mut EntityRegistry, outcome: &MoveOutcome) -> Result<(), CommandError> {
    match *outcome {
        MoveOutcome::Move { unit, to, cost, .. } => {
            registry.relocate_unit(unit, to)?;
            registry.spend_moves(unit, cost)?;
        }
        MoveOutcome::Capture {
            unit, city, to, cost, ..
        } => {
            let owner = registry.try_unit(unit)?.owner;
            registry.relocate_unit(unit, to)?;
            registry.spend_moves(unit, cost)?;
            registry.set_city_owner(city, Some(owner))?;
        }
        MoveOutcome::Engage {
            attacker,
            staging,
            cost,
            ..
        } => {
            registry.relocate_unit(attacker, staging)?;
            registry.spend_moves(attacker, cost)?;
        }
    }
    Ok(())
}
