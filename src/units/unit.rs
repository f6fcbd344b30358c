//! Unit records.

use serde::{Deserialize, Serialize};

use super::class::{ClassStats, UnitClass};
use crate::core::{Coord, PlayerId, UnitId};

/// Lifecycle status of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    Active,
    Destroyed,
}

/// A single unit.
///
/// Fields are readable by anyone; mutation goes through the registry so the
/// coordinate and owner indexes stay consistent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: PlayerId,
    pub class: UnitClass,
    pub coord: Coord,

    /// Movement points left this turn.
    pub moves_left: u32,

    /// Remaining fuel for fuel-limited classes.
    pub fuel: Option<u32>,

    pub status: UnitStatus,
}

impl Unit {
    /// Create a fresh unit with full movement and fuel for its class.
    #[must_use]
    pub fn new(id: UnitId, owner: PlayerId, class: UnitClass, coord: Coord, stats: &ClassStats) -> Self {
        Self {
            id,
            owner,
            class,
            coord,
            moves_left: stats.movement,
            fuel: stats.fuel,
            status: UnitStatus::Active,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UnitStatus::Active
    }

    #[must_use]
    pub fn can_move(&self) -> bool {
        self.is_active() && self.moves_left > 0
    }
}
