//! Pluggable turn planners.
//!
//! A commander sees only its player's `PlayerView` and answers with a list
//! of commands. The engine executes them in order and ends the turn, so a
//! commander can never act outside its own turn or see through fog.

use rustc_hash::FxHashSet;

use crate::core::Coord;
use crate::turn::Command;
use crate::units::UnitClass;
use crate::view::{PlayerView, UnitSighting};

// =============================================================================
// Commander
// =============================================================================

/// Plans one turn for one player.
pub trait Commander {
    /// Commands to run this turn, in order. `EndTurn` is implied.
    fn plan(&mut self, view: &PlayerView) -> Vec<Command>;
}

/// Ends every turn without acting.
#[derive(Clone, Debug, Default)]
pub struct IdleCommander;

impl Commander for IdleCommander {
    fn plan(&mut self, _view: &PlayerView) -> Vec<Command> {
        Vec::new()
    }
}

// =============================================================================
// Raider
// =============================================================================

/// Sends every unit one step toward the nearest city it does not own.
///
/// With no such city in sight or memory, units head for the nearest unseen
/// tile instead. Own cities are kept building armies.
#[derive(Clone, Debug, Default)]
pub struct RaiderCommander;

impl RaiderCommander {
    fn target(view: &PlayerView, from: Coord) -> Option<Coord> {
        let cities = view
            .cities
            .iter()
            .filter(|c| c.owner != Some(view.player))
            .map(|c| c.coord)
            .chain(view.remembered_cities.iter().copied());
        if let Some(city) = cities.min_by_key(|&c| (from.distance(c), c)) {
            return Some(city);
        }

        (0..view.height as i32)
            .flat_map(|row| (0..view.width as i32).map(move |col| Coord::new(col, row)))
            .filter(|&c| view.terrain(c).is_none())
            .min_by_key(|&c| (from.distance(c), c))
    }

    /// Best neighbouring tile toward `target` the unit may plausibly enter.
    ///
    /// Fuel-limited units stay put.
    fn step(view: &PlayerView, unit: &UnitSighting, target: Coord, reserved: &FxHashSet<Coord>) -> Option<Coord> {
        if unit.fuel.is_some() {
            return None;
        }
        unit.coord
            .ring()
            .into_iter()
            .filter(|&c| {
                // Unseen tiles are a gamble; let the engine reject bad guesses.
                view.terrain(c).map_or(true, |t| unit.domain.permits(t))
                    && !reserved.contains(&c)
                    && view.unit_at(c).map_or(true, |u| u.owner != view.player)
            })
            .filter(|&c| c.distance(target) < unit.coord.distance(target))
            .min_by_key(|&c| (c.distance(target), c))
    }
}

impl Commander for RaiderCommander {
    fn plan(&mut self, view: &PlayerView) -> Vec<Command> {
        let mut commands = Vec::new();

        for city in view.own_cities() {
            if city.production != Some(UnitClass::Army) {
                commands.push(Command::EditCity(city.id));
                commands.push(Command::SetProduction {
                    city: city.id,
                    class: Some(UnitClass::Army),
                });
                commands.push(Command::Cancel);
            }
        }

        let mut reserved: FxHashSet<Coord> = view.own_units().map(|u| u.coord).collect();
        for unit in view.own_units() {
            if unit.moves_left == Some(0) {
                continue;
            }
            let Some(target) = Self::target(view, unit.coord) else {
                continue;
            };
            if let Some(step) = Self::step(view, unit, target, &reserved) {
                reserved.remove(&unit.coord);
                reserved.insert(step);
                commands.push(Command::SelectUnit(unit.id));
                commands.push(Command::MoveUnit(step));
            }
        }

        if !commands.is_empty() {
            commands.push(Command::Cancel);
        }
        commands
    }
}
