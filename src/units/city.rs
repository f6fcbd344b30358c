//! City records.
//!
//! Cities are created neutral during world generation and are never
//! destroyed, only re-owned.

use serde::{Deserialize, Serialize};

use super::class::UnitClass;
use crate::core::{CityId, Coord, PlayerId};

/// A city.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,

    /// Owning player. `None` for neutral.
    pub owner: Option<PlayerId>,

    pub coord: Coord,

    /// Current production order.
    pub production: Option<UnitClass>,

    /// Turn-cycles accumulated toward the current order.
    pub progress: u32,

    /// Turn-cycles the current order requires. Zero when idle.
    pub cost: u32,
}

impl City {
    /// Create a neutral, idle city.
    #[must_use]
    pub fn neutral(id: CityId, coord: Coord) -> Self {
        Self {
            id,
            owner: None,
            coord,
            production: None,
            progress: 0,
            cost: 0,
        }
    }

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// A finished unit is waiting for a free tile.
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.production.is_some() && self.cost > 0 && self.progress >= self.cost
    }
}
