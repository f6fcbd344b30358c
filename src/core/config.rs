//! Engine configuration.
//!
//! Every tunable the engine uses is supplied here rather than hard-coded:
//! grid size, city counts and spacing, land-fraction bounds, per-class unit
//! descriptors, vision radii, combat probability bounds and the random seed.
//!
//! Configs load from YAML; every field has a default so partial files work.
//!
//! ```
//! use rust_empire::core::EngineConfig;
//!
//! let config = EngineConfig::from_yaml_str("seed: 7\nmap:\n  width: 40\n  height: 20\n").unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.map.width, 40);
//! assert_eq!(config.players, 2);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::units::{ClassTable, UnitClass};

/// World-generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,

    /// Number of cities generation aims for.
    pub target_city_count: u32,

    /// Hard minimum; generation fails rather than produce fewer.
    pub min_city_count: u32,

    /// Minimum Chebyshev distance between any two cities.
    pub min_city_distance: u32,

    pub land_fraction_min: f64,
    pub land_fraction_max: f64,

    /// Number of land blobs to grow. Derived from the area when `None`.
    pub blob_count: Option<u32>,

    /// Bounded retries for terrain and city placement.
    pub max_attempts: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 24,
            target_city_count: 12,
            min_city_count: 4,
            min_city_distance: 3,
            land_fraction_min: 0.25,
            land_fraction_max: 0.45,
            blob_count: None,
            max_attempts: 16,
        }
    }
}

impl MapConfig {
    /// Blob count to use for this grid.
    #[must_use]
    pub fn effective_blob_count(&self) -> u32 {
        self.blob_count
            .unwrap_or_else(|| (self.width.saturating_mul(self.height) / 120).clamp(1, 12))
    }
}

/// Class-pair advantage: attacker strength is multiplied by `multiplier`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub attacker: UnitClass,
    pub defender: UnitClass,
    pub multiplier: f64,
}

impl Matchup {
    #[must_use]
    pub fn new(attacker: UnitClass, defender: UnitClass, multiplier: f64) -> Self {
        Self {
            attacker,
            defender,
            multiplier,
        }
    }
}

/// Combat-resolution parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Lowest attacker win probability.
    pub win_floor: f64,

    /// Highest attacker win probability.
    pub win_ceiling: f64,

    /// Defender strength multiplier when defending inside a friendly city.
    pub city_defense_bonus: f64,

    pub matchups: Vec<Matchup>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            win_floor: 0.1,
            win_ceiling: 0.9,
            city_defense_bonus: 1.0,
            matchups: vec![
                Matchup::new(UnitClass::Destroyer, UnitClass::Submarine, 2.0),
                Matchup::new(UnitClass::Fighter, UnitClass::Army, 1.5),
                Matchup::new(UnitClass::Submarine, UnitClass::Battleship, 1.5),
                Matchup::new(UnitClass::Submarine, UnitClass::Carrier, 1.5),
            ],
        }
    }
}

impl CombatConfig {
    /// Attacker multiplier for a class pair (1.0 when unlisted).
    #[must_use]
    pub fn matchup(&self, attacker: UnitClass, defender: UnitClass) -> f64 {
        self.matchups
            .iter()
            .find(|m| m.attacker == attacker && m.defender == defender)
            .map_or(1.0, |m| m.multiplier)
    }
}

/// Initial-position parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Units spawned at each player's home city.
    pub starting_units: Vec<UnitClass>,

    /// Production order given to each home city.
    pub default_production: Option<UnitClass>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            starting_units: vec![UnitClass::Army],
            default_production: Some(UnitClass::Army),
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine's single random stream.
    pub seed: u64,

    /// Number of players (2-8).
    pub players: usize,

    pub map: MapConfig,

    /// Vision radius of cities (Chebyshev tiles).
    pub city_vision_radius: u32,

    pub units: ClassTable,
    pub combat: CombatConfig,
    pub setup: SetupConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            players: 2,
            map: MapConfig::default(),
            city_vision_radius: 3,
            units: ClassTable::default(),
            combat: CombatConfig::default(),
            setup: SetupConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject configurations no game can be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=8).contains(&self.players) {
            return Err(ConfigError::Invalid(format!(
                "players must be 2-8, got {}",
                self.players
            )));
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(ConfigError::Invalid("grid must not be empty".into()));
        }
        if self.map.width > i32::MAX as u32 || self.map.height > i32::MAX as u32 {
            return Err(ConfigError::Invalid("grid dimensions too large".into()));
        }
        let (lo, hi) = (self.map.land_fraction_min, self.map.land_fraction_max);
        if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
            return Err(ConfigError::Invalid(format!(
                "land fraction bounds [{lo}, {hi}] are not an ordered range within [0, 1]"
            )));
        }
        if self.map.min_city_count > self.map.target_city_count {
            return Err(ConfigError::Invalid(
                "min_city_count exceeds target_city_count".into(),
            ));
        }
        if self.map.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        let (floor, ceiling) = (self.combat.win_floor, self.combat.win_ceiling);
        if !(floor > 0.0 && ceiling < 1.0 && floor <= ceiling) {
            return Err(ConfigError::Invalid(format!(
                "win probability bounds [{floor}, {ceiling}] must satisfy 0 < floor <= ceiling < 1"
            )));
        }
        let positive = |x: f64| x.is_finite() && x > 0.0;
        if !positive(self.combat.city_defense_bonus) {
            return Err(ConfigError::Invalid(
                "city_defense_bonus must be finite and positive".into(),
            ));
        }
        if let Some(m) = self.combat.matchups.iter().find(|m| !positive(m.multiplier)) {
            return Err(ConfigError::Invalid(format!(
                "matchup {} vs {} needs a finite positive multiplier",
                m.attacker, m.defender
            )));
        }
        for (class, stats) in self.units.iter() {
            if stats.build_cost == 0 {
                return Err(ConfigError::Invalid(format!("{class} build_cost must be positive")));
            }
            if stats.fuel == Some(0) {
                return Err(ConfigError::Invalid(format!("{class} fuel capacity must be positive")));
            }
        }
        Ok(())
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the player count.
    #[must_use]
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    /// Set the grid size.
    #[must_use]
    pub fn with_grid(mut self, width: u32, height: u32) -> Self {
        self.map.width = width;
        self.map.height = height;
        self
    }

    /// Set the target and hard-minimum city counts.
    #[must_use]
    pub fn with_cities(mut self, target: u32, minimum: u32) -> Self {
        self.map.target_city_count = target;
        self.map.min_city_count = minimum;
        self
    }

    /// Set the combat probability bounds.
    #[must_use]
    pub fn with_win_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.combat.win_floor = floor;
        self.combat.win_ceiling = ceiling;
        self
    }
}
