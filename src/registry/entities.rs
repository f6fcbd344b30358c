//! The entity registry: sole owner of every unit and city.
//!
//! Records are stored in id-ordered maps so iteration is deterministic.
//! Three derived indexes are maintained alongside them:
//!
//! - coordinate -> unit (`FxHashMap`, O(1))
//! - coordinate -> city (`FxHashMap`, O(1))
//! - player -> unit ids
//!
//! The indexes are not serialized. [`EntityRegistry::rebuild_indexes`]
//! recomputes them after deserialization and [`EntityRegistry::validate`]
//! checks the records against a grid before a restored registry is used.
//!
//! All mutation goes through methods on the registry; callers only ever
//! receive shared references to records.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{CityId, CommandError, Coord, EntityRef, PlayerId, RejectReason, UnitId};
use crate::terrain::TileGrid;
use crate::units::{City, ClassStats, ClassTable, Unit, UnitClass, UnitStatus};

/// Registry of units and cities.
///
/// ## Example
///
/// ```
/// use rust_empire::core::{Coord, PlayerId};
/// use rust_empire::registry::EntityRegistry;
/// use rust_empire::units::{ClassTable, UnitClass};
///
/// let table = ClassTable::default();
/// let mut registry = EntityRegistry::new();
///
/// let city = registry.add_city(Coord::new(2, 2));
/// registry.set_city_owner(city, Some(PlayerId::new(0))).unwrap();
///
/// let army = registry
///     .create_unit(PlayerId::new(0), UnitClass::Army, Coord::new(2, 2), table.get(UnitClass::Army))
///     .unwrap();
///
/// assert_eq!(registry.unit_at(Coord::new(2, 2)).map(|u| u.id), Some(army));
/// assert_eq!(registry.cities_of(PlayerId::new(0)).count(), 1);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityRegistry {
    units: BTreeMap<UnitId, Unit>,
    cities: BTreeMap<CityId, City>,
    next_unit: u32,
    next_city: u32,

    #[serde(skip)]
    unit_index: FxHashMap<Coord, UnitId>,
    #[serde(skip)]
    city_index: FxHashMap<Coord, CityId>,
    #[serde(skip)]
    owner_index: BTreeMap<PlayerId, BTreeSet<UnitId>>,
}

impl PartialEq for EntityRegistry {
    /// Records and id counters; the indexes are derived.
    fn eq(&self, other: &Self) -> bool {
        self.units == other.units
            && self.cities == other.cities
            && self.next_unit == other.next_unit
            && self.next_city == other.next_city
    }
}

impl Eq for EntityRegistry {}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Cities ===

    /// Add a neutral city with the next free id.
    pub fn add_city(&mut self, coord: Coord) -> CityId {
        let id = CityId::new(self.next_city);
        self.insert_city(City::neutral(id, coord));
        id
    }

    /// Insert a city record under its own id.
    ///
    /// Later auto-assigned ids continue past it.
    pub fn insert_city(&mut self, city: City) {
        self.next_city = self.next_city.max(city.id.raw() + 1);
        self.city_index.insert(city.coord, city.id);
        self.cities.insert(city.id, city);
    }

    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(&id)
    }

    /// City by id, or `EntityNotFound`.
    pub fn try_city(&self, id: CityId) -> Result<&City, CommandError> {
        self.city(id)
            .ok_or(CommandError::EntityNotFound(EntityRef::City(id)))
    }

    #[must_use]
    pub fn city_at(&self, coord: Coord) -> Option<&City> {
        self.city_index.get(&coord).and_then(|id| self.cities.get(id))
    }

    /// All cities in id order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// Cities owned by `player`, in id order.
    pub fn cities_of(&self, player: PlayerId) -> impl Iterator<Item = &City> {
        self.cities.values().filter(move |c| c.is_owned_by(player))
    }

    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Reassign ownership. Production is reset to none with zero progress.
    pub fn set_city_owner(&mut self, id: CityId, owner: Option<PlayerId>) -> Result<(), CommandError> {
        let city = self.city_mut(id)?;
        city.owner = owner;
        city.production = None;
        city.progress = 0;
        city.cost = 0;
        Ok(())
    }

    /// Set the production order.
    ///
    /// Switching to a different class restarts progress; re-issuing the
    /// current class keeps it. `None` clears the order.
    pub fn set_city_production(
        &mut self,
        id: CityId,
        order: Option<(UnitClass, u32)>,
    ) -> Result<(), CommandError> {
        let city = self.city_mut(id)?;
        match order {
            Some((class, cost)) => {
                if city.production != Some(class) {
                    city.progress = 0;
                }
                city.production = Some(class);
                city.cost = cost;
                city.progress = city.progress.min(cost);
            }
            None => {
                city.production = None;
                city.progress = 0;
                city.cost = 0;
            }
        }
        Ok(())
    }

    /// Add one turn of progress, saturating at the cost. Returns the new progress.
    pub fn advance_city_progress(&mut self, id: CityId) -> Result<u32, CommandError> {
        let city = self.city_mut(id)?;
        if city.production.is_some() && city.progress < city.cost {
            city.progress += 1;
        }
        Ok(city.progress)
    }

    /// Restart progress toward the current order.
    pub fn reset_city_progress(&mut self, id: CityId) -> Result<(), CommandError> {
        self.city_mut(id)?.progress = 0;
        Ok(())
    }

    fn city_mut(&mut self, id: CityId) -> Result<&mut City, CommandError> {
        self.cities
            .get_mut(&id)
            .ok_or(CommandError::EntityNotFound(EntityRef::City(id)))
    }

    // === Units ===

    /// Create a unit with full movement and fuel.
    ///
    /// Fails with `FriendlyOccupied` if the tile already holds a unit.
    pub fn create_unit(
        &mut self,
        owner: PlayerId,
        class: UnitClass,
        coord: Coord,
        stats: &ClassStats,
    ) -> Result<UnitId, CommandError> {
        if self.unit_index.contains_key(&coord) {
            return Err(CommandError::Illegal(RejectReason::FriendlyOccupied));
        }
        let id = UnitId::new(self.next_unit);
        self.next_unit += 1;
        self.unit_index.insert(coord, id);
        self.owner_index.entry(owner).or_default().insert(id);
        self.units.insert(id, Unit::new(id, owner, class, coord, stats));
        Ok(id)
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Unit by id, or `EntityNotFound`.
    pub fn try_unit(&self, id: UnitId) -> Result<&Unit, CommandError> {
        self.unit(id)
            .ok_or(CommandError::EntityNotFound(EntityRef::Unit(id)))
    }

    #[must_use]
    pub fn unit_at(&self, coord: Coord) -> Option<&Unit> {
        self.unit_index.get(&coord).and_then(|id| self.units.get(id))
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Units owned by `player`, in id order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.owner_index
            .get(&player)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.units.get(id))
    }

    /// Ids of units owned by `player`, in id order.
    #[must_use]
    pub fn unit_ids_of(&self, player: PlayerId) -> Vec<UnitId> {
        self.owner_index
            .get(&player)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Relocate a unit. The destination must not hold another unit.
    pub fn relocate_unit(&mut self, id: UnitId, to: Coord) -> Result<(), CommandError> {
        if let Some(&other) = self.unit_index.get(&to) {
            if other != id {
                return Err(CommandError::Illegal(RejectReason::FriendlyOccupied));
            }
        }
        let unit = self.unit_mut(id)?;
        let from = unit.coord;
        unit.coord = to;
        self.unit_index.remove(&from);
        self.unit_index.insert(to, id);
        Ok(())
    }

    /// Debit movement points, saturating at zero. Returns what is left.
    pub fn spend_moves(&mut self, id: UnitId, cost: u32) -> Result<u32, CommandError> {
        let unit = self.unit_mut(id)?;
        unit.moves_left = unit.moves_left.saturating_sub(cost);
        Ok(unit.moves_left)
    }

    /// Restore every unit of `player` to its class movement allowance.
    pub fn reset_moves(&mut self, player: PlayerId, table: &ClassTable) {
        for id in self.unit_ids_of(player) {
            if let Some(unit) = self.units.get_mut(&id) {
                unit.moves_left = table.get(unit.class).movement;
            }
        }
    }

    /// Refill fuel to `capacity`.
    pub fn refuel(&mut self, id: UnitId, capacity: u32) -> Result<(), CommandError> {
        self.unit_mut(id)?.fuel = Some(capacity);
        Ok(())
    }

    /// Burn one turn of fuel. Returns the remaining fuel, `None` if unlimited.
    pub fn burn_fuel(&mut self, id: UnitId) -> Result<Option<u32>, CommandError> {
        let unit = self.unit_mut(id)?;
        if let Some(fuel) = unit.fuel.as_mut() {
            *fuel = fuel.saturating_sub(1);
        }
        Ok(unit.fuel)
    }

    /// Remove a unit. The returned record is marked destroyed.
    pub fn destroy_unit(&mut self, id: UnitId) -> Result<Unit, CommandError> {
        let mut unit = self
            .units
            .remove(&id)
            .ok_or(CommandError::EntityNotFound(EntityRef::Unit(id)))?;
        if self.unit_index.get(&unit.coord) == Some(&id) {
            self.unit_index.remove(&unit.coord);
        }
        if let Some(ids) = self.owner_index.get_mut(&unit.owner) {
            ids.remove(&id);
            if ids.is_empty() {
                self.owner_index.remove(&unit.owner);
            }
        }
        unit.status = UnitStatus::Destroyed;
        Ok(unit)
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, CommandError> {
        self.units
            .get_mut(&id)
            .ok_or(CommandError::EntityNotFound(EntityRef::Unit(id)))
    }

    // === Indexes ===

    /// Recompute every derived index from the records.
    pub fn rebuild_indexes(&mut self) {
        self.unit_index.clear();
        self.city_index.clear();
        self.owner_index.clear();
        for unit in self.units.values() {
            self.unit_index.insert(unit.coord, unit.id);
            self.owner_index.entry(unit.owner).or_default().insert(unit.id);
        }
        for city in self.cities.values() {
            self.city_index.insert(city.coord, city.id);
        }
    }

    /// Check records against a grid, a class table and a player count.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self, grid: &TileGrid, table: &ClassTable, player_count: usize) -> Result<(), String> {
        let mut seen_units: FxHashMap<Coord, UnitId> = FxHashMap::default();
        for (&id, unit) in &self.units {
            if unit.id != id {
                return Err(format!("{id} stored under mismatched key"));
            }
            if id.raw() >= self.next_unit {
                return Err(format!("{id} at or beyond the id counter"));
            }
            if !unit.is_active() {
                return Err(format!("{id} is destroyed but still registered"));
            }
            if unit.owner.index() >= player_count {
                return Err(format!("{id} owned by unknown {}", unit.owner));
            }
            let Some(terrain) = grid.terrain(unit.coord) else {
                return Err(format!("{id} out of bounds at {}", unit.coord));
            };
            let stats = table.get(unit.class);
            if !stats.domain.permits(terrain) {
                return Err(format!("{id} ({}) on forbidden terrain at {}", unit.class, unit.coord));
            }
            if unit.moves_left > stats.movement {
                return Err(format!("{id} has more movement than its class allows"));
            }
            if let (Some(fuel), Some(capacity)) = (unit.fuel, stats.fuel) {
                if fuel > capacity {
                    return Err(format!("{id} has more fuel than its class allows"));
                }
            }
            if let Some(other) = seen_units.insert(unit.coord, id) {
                return Err(format!("{other} and {id} share {}", unit.coord));
            }
        }

        let mut seen_cities: FxHashMap<Coord, CityId> = FxHashMap::default();
        for (&id, city) in &self.cities {
            if city.id != id {
                return Err(format!("{id} stored under mismatched key"));
            }
            if id.raw() >= self.next_city {
                return Err(format!("{id} at or beyond the id counter"));
            }
            if !grid.is_land(city.coord) {
                return Err(format!("{id} not on a land tile at {}", city.coord));
            }
            if let Some(owner) = city.owner {
                if owner.index() >= player_count {
                    return Err(format!("{id} owned by unknown {owner}"));
                }
            }
            match city.production {
                Some(class) if city.cost != table.get(class).build_cost => {
                    return Err(format!("{id} builds {class} at cost {}", city.cost));
                }
                None if (city.cost, city.progress) != (0, 0) => {
                    return Err(format!("{id} is idle with cost or progress"));
                }
                _ => {}
            }
            if city.progress > city.cost {
                return Err(format!("{id} progress {} exceeds cost {}", city.progress, city.cost));
            }
            if let Some(other) = seen_cities.insert(city.coord, id) {
                return Err(format!("{other} and {id} share {}", city.coord));
            }
        }

        if self.unit_index.len() != self.units.len() || self.city_index.len() != self.cities.len() {
            return Err("coordinate indexes out of sync with records".into());
        }
        Ok(())
    }
}
