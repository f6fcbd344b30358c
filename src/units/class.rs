//! Unit classes and their data-driven descriptors.
//!
//! A unit is a single record parameterized by its `UnitClass`; per-class
//! behavior (movement allowance, domain, strength, fuel, vision, build cost)
//! comes from a `ClassTable` supplied by configuration, never from code
//! branches on the class.

use serde::{Deserialize, Serialize};

use crate::terrain::Terrain;

/// Terrain category a unit class may traverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Land,
    Sea,
    Air,
}

impl Domain {
    /// Whether a unit of this domain may stand on `terrain`.
    #[must_use]
    pub fn permits(self, terrain: Terrain) -> bool {
        match self {
            Domain::Land => terrain == Terrain::Land,
            Domain::Sea => terrain == Terrain::Ocean,
            Domain::Air => true,
        }
    }
}

/// Named category of unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Army,
    Fighter,
    Destroyer,
    Submarine,
    Transport,
    Carrier,
    Battleship,
}

impl UnitClass {
    /// Every class, in production-menu order.
    pub const ALL: [UnitClass; 7] = [
        UnitClass::Army,
        UnitClass::Fighter,
        UnitClass::Destroyer,
        UnitClass::Submarine,
        UnitClass::Transport,
        UnitClass::Carrier,
        UnitClass::Battleship,
    ];

    /// Map glyph (uppercase; renderers lowercase it for enemies).
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            UnitClass::Army => 'A',
            UnitClass::Fighter => 'F',
            UnitClass::Destroyer => 'D',
            UnitClass::Submarine => 'S',
            UnitClass::Transport => 'T',
            UnitClass::Carrier => 'C',
            UnitClass::Battleship => 'B',
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            UnitClass::Army => "Army",
            UnitClass::Fighter => "Fighter",
            UnitClass::Destroyer => "Destroyer",
            UnitClass::Submarine => "Submarine",
            UnitClass::Transport => "Transport",
            UnitClass::Carrier => "Carrier",
            UnitClass::Battleship => "Battleship",
        }
    }
}

impl std::fmt::Display for UnitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptor for one unit class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    /// Movement points granted at the start of the owner's turn.
    pub movement: u32,

    /// Terrain the class may occupy.
    pub domain: Domain,

    /// Base combat strength.
    pub strength: u32,

    /// Turns aloft before forced loss. `None` for unlimited.
    #[serde(default)]
    pub fuel: Option<u32>,

    /// Vision radius (Chebyshev tiles).
    pub vision: u32,

    /// Turn-cycles a city needs to build one.
    pub build_cost: u32,

    /// Whether cities may be ordered to produce this class.
    #[serde(default = "default_true")]
    pub buildable: bool,
}

fn default_true() -> bool {
    true
}

impl ClassStats {
    /// Create a descriptor with no fuel limit.
    #[must_use]
    pub fn new(domain: Domain, movement: u32, strength: u32, vision: u32, build_cost: u32) -> Self {
        Self {
            movement,
            domain,
            strength,
            fuel: None,
            vision,
            build_cost,
            buildable: true,
        }
    }

    /// Set a fuel capacity.
    #[must_use]
    pub fn with_fuel(mut self, fuel: u32) -> Self {
        self.fuel = Some(fuel);
        self
    }
}

fn default_army() -> ClassStats {
    ClassStats::new(Domain::Land, 1, 2, 2, 6)
}

fn default_fighter() -> ClassStats {
    ClassStats::new(Domain::Air, 6, 2, 4, 10).with_fuel(8)
}

fn default_destroyer() -> ClassStats {
    ClassStats::new(Domain::Sea, 3, 2, 2, 12)
}

fn default_submarine() -> ClassStats {
    ClassStats::new(Domain::Sea, 2, 3, 2, 16)
}

fn default_transport() -> ClassStats {
    ClassStats::new(Domain::Sea, 2, 1, 2, 14)
}

fn default_carrier() -> ClassStats {
    ClassStats::new(Domain::Sea, 2, 1, 3, 24)
}

fn default_battleship() -> ClassStats {
    ClassStats::new(Domain::Sea, 2, 4, 2, 32)
}

/// One `ClassStats` per `UnitClass`.
///
/// Stored as named fields so every class always has a descriptor; lookups
/// are total and never fail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTable {
    #[serde(default = "default_army")]
    pub army: ClassStats,
    #[serde(default = "default_fighter")]
    pub fighter: ClassStats,
    #[serde(default = "default_destroyer")]
    pub destroyer: ClassStats,
    #[serde(default = "default_submarine")]
    pub submarine: ClassStats,
    #[serde(default = "default_transport")]
    pub transport: ClassStats,
    #[serde(default = "default_carrier")]
    pub carrier: ClassStats,
    #[serde(default = "default_battleship")]
    pub battleship: ClassStats,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self {
            army: default_army(),
            fighter: default_fighter(),
            destroyer: default_destroyer(),
            submarine: default_submarine(),
            transport: default_transport(),
            carrier: default_carrier(),
            battleship: default_battleship(),
        }
    }
}

impl ClassTable {
    /// Descriptor for a class.
    #[must_use]
    pub fn get(&self, class: UnitClass) -> &ClassStats {
        match class {
            UnitClass::Army => &self.army,
            UnitClass::Fighter => &self.fighter,
            UnitClass::Destroyer => &self.destroyer,
            UnitClass::Submarine => &self.submarine,
            UnitClass::Transport => &self.transport,
            UnitClass::Carrier => &self.carrier,
            UnitClass::Battleship => &self.battleship,
        }
    }

    /// Mutable descriptor for a class.
    pub fn get_mut(&mut self, class: UnitClass) -> &mut ClassStats {
        match class {
            UnitClass::Army => &mut self.army,
            UnitClass::Fighter => &mut self.fighter,
            UnitClass::Destroyer => &mut self.destroyer,
            UnitClass::Submarine => &mut self.submarine,
            UnitClass::Transport => &mut self.transport,
            UnitClass::Carrier => &mut self.carrier,
            UnitClass::Battleship => &mut self.battleship,
        }
    }

    /// Iterate over (class, descriptor) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (UnitClass, &ClassStats)> {
        UnitClass::ALL.into_iter().map(move |class| (class, self.get(class)))
    }
}
