//! Probabilistic combat resolution.
//!
//! The attacker's win probability is its share of the combined effective
//! strength, clamped to the configured floor and ceiling:
//!
//! ```text
//! a = attacker strength * matchup(attacker class, defender class)
//! d = defender strength * (city_defense_bonus if defending in a city)
//! p = clamp(a / (a + d), win_floor, win_ceiling)
//! ```
//!
//! One uniform draw from the engine's stream decides the fight: the
//! attacker wins when the draw is below `p`. The loser is removed from the
//! registry. A city whose defender dies is not captured here.

use tracing::debug;

use crate::core::{CombatConfig, CommandError, GameRng, UnitId};
use crate::registry::EntityRegistry;
use crate::units::{ClassTable, Unit};

/// Which side won an engagement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Victor {
    Attacker,
    Defender,
}

/// Result of one resolved engagement.
#[derive(Clone, Debug, PartialEq)]
pub struct CombatOutcome {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub victor: Victor,

    /// Attacker win probability used for the draw.
    pub probability: f64,

    /// The uniform draw in `[0, 1)`.
    pub roll: f64,

    /// The removed loser, marked destroyed.
    pub casualty: Unit,
}

impl CombatOutcome {
    #[must_use]
    pub fn attacker_won(&self) -> bool {
        self.victor == Victor::Attacker
    }

    /// Id of the surviving unit.
    #[must_use]
    pub fn survivor(&self) -> UnitId {
        match self.victor {
            Victor::Attacker => self.attacker,
            Victor::Defender => self.defender,
        }
    }
}

/// Clamped share of combined strength.
///
/// Monotonically non-decreasing in `attack` and always within
/// `[floor, ceiling]`. Two zero strengths give an even fight, as do two
/// infinite ones. NaN counts as zero.
///
/// ```
/// use rust_empire::combat::win_probability;
///
/// assert_eq!(win_probability(2.0, 2.0, 0.1, 0.9), 0.5);
/// assert_eq!(win_probability(1000.0, 1.0, 0.1, 0.9), 0.9);
/// ```
#[must_use]
pub fn win_probability(attack: f64, defense: f64, floor: f64, ceiling: f64) -> f64 {
    let attack = attack.max(0.0);
    let defense = defense.max(0.0);
    let share = match (attack.is_infinite(), defense.is_infinite()) {
        (true, true) => 0.5,
        (true, false) => 1.0,
        (false, true) => 0.0,
        (false, false) if attack > 0.0 => 1.0 / (1.0 + defense / attack),
        (false, false) if defense > 0.0 => 0.0,
        (false, false) => 0.5,
    };
    share.clamp(floor, ceiling)
}

/// Attacker win probability for a specific pair of units.
#[must_use]
pub fn engagement_odds(
    attacker: &Unit,
    defender: &Unit,
    defender_in_city: bool,
    classes: &ClassTable,
    config: &CombatConfig,
) -> f64 {
    let attack = f64::from(classes.get(attacker.class).strength)
        * config.matchup(attacker.class, defender.class);
    let mut defense = f64::from(classes.get(defender.class).strength);
    if defender_in_city {
        defense *= config.city_defense_bonus;
    }
    win_probability(attack, defense, config.win_floor, config.win_ceiling)
}

/// Resolve an engagement and remove the loser.
pub fn resolve(
    registry: &mut EntityRegistry,
    attacker_id: UnitId,
    defender_id: UnitId,
    classes: &ClassTable,
    config: &CombatConfig,
    rng: &mut GameRng,
) -> Result<CombatOutcome, CommandError> {
    let attacker = registry.try_unit(attacker_id)?;
    let defender = registry.try_unit(defender_id)?;
    let in_city = registry
        .city_at(defender.coord)
        .map_or(false, |c| c.is_owned_by(defender.owner));
    let probability = engagement_odds(attacker, defender, in_city, classes, config);

    let roll = rng.gen_f64();
    let victor = if roll < probability {
        Victor::Attacker
    } else {
        Victor::Defender
    };
    let loser = match victor {
        Victor::Attacker => defender_id,
        Victor::Defender => attacker_id,
    };
    let casualty = registry.destroy_unit(loser)?;

    debug!(
        attacker = %attacker_id,
        defender = %defender_id,
        probability,
        roll,
        ?victor,
        "combat resolved"
    );

    Ok(CombatOutcome {
        attacker: attacker_id,
        defender: defender_id,
        victor,
        probability,
        roll,
        casualty,
    })
}
