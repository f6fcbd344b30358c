//! Turn state: active player, mode, turn counter, eliminations and result.
//!
//! ## Mode transitions
//!
//! | command          | from                 | to                       |
//! |------------------|----------------------|--------------------------|
//! | `select_unit`    | any                  | `Move { unit }`          |
//! | `edit_city`      | any                  | `Edit { city }`          |
//! | `cancel`         | any                  | `Orders`                 |
//! | `move_unit`      | `Move`               | `Move`, or `Orders` once the unit is spent or dead |
//! | `set_production` | `Orders`, `Edit`     | unchanged                |
//! | `end_turn`       | any                  | `Orders` for the next player |
//!
//! The turn counter starts at 0 and increments each time play wraps from
//! the last seat back to the first, i.e. once per full player cycle.

use serde::{Deserialize, Serialize};

use crate::core::{CityId, PlayerId, PlayerMap, UnitId};

/// Interaction mode of the active player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Nothing selected.
    #[default]
    Orders,
    /// A unit is selected for movement.
    Move { unit: UnitId },
    /// A city is open for production editing.
    Edit { city: CityId },
}

/// Final result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    Winner(PlayerId),
    /// Every player was eliminated at once.
    Draw,
}

/// Turn progression state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub active: PlayerId,
    pub mode: Mode,

    /// Full player cycles completed.
    pub turn: u32,

    pub eliminated: PlayerMap<bool>,

    /// Set once the game is over; no mutating command is accepted after.
    pub result: Option<GameResult>,
}

impl TurnState {
    /// Player 1 to move in `Orders` mode, turn 0.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            active: PlayerId::new(0),
            mode: Mode::Orders,
            turn: 0,
            eliminated: PlayerMap::with_value(player_count, false),
            result: None,
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.eliminated.player_count()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    #[must_use]
    pub fn is_eliminated(&self, player: PlayerId) -> bool {
        self.eliminated.get(player).copied().unwrap_or(true)
    }

    /// Players still in the game, in seat order.
    pub fn remaining(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.eliminated
            .iter()
            .filter(|(_, out)| !**out)
            .map(|(player, _)| player)
    }

    /// The next non-eliminated seat after the active one, and whether
    /// reaching it wraps past the last seat. `None` if nobody remains.
    #[must_use]
    pub fn next_active(&self) -> Option<(PlayerId, bool)> {
        let count = self.player_count();
        let mut candidate = self.active;
        let mut wrapped = false;
        for _ in 0..count {
            let next = candidate.next(count);
            if next.index() <= candidate.index() {
                wrapped = true;
            }
            candidate = next;
            if !self.is_eliminated(candidate) {
                return Some((candidate, wrapped));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = TurnState::new(3);

        assert_eq!(state.active, PlayerId::new(0));
        assert_eq!(state.mode, Mode::Orders);
        assert_eq!(state.turn, 0);
        assert!(!state.is_over());
        assert_eq!(state.remaining().count(), 3);
    }

    #[test]
    fn test_next_active_wraps() {
        let mut state = TurnState::new(2);
        assert_eq!(state.next_active(), Some((PlayerId::new(1), false)));

        state.active = PlayerId::new(1);
        assert_eq!(state.next_active(), Some((PlayerId::new(0), true)));
    }

    #[test]
    fn test_next_active_skips_eliminated() {
        let mut state = TurnState::new(4);
        state.eliminated[PlayerId::new(1)] = true;
        state.eliminated[PlayerId::new(2)] = true;

        assert_eq!(state.next_active(), Some((PlayerId::new(3), false)));

        state.active = PlayerId::new(3);
        assert_eq!(state.next_active(), Some((PlayerId::new(0), true)));
    }

    #[test]
    fn test_next_active_when_alone_returns_self() {
        let mut state = TurnState::new(2);
        state.eliminated[PlayerId::new(1)] = true;

        assert_eq!(state.next_active(), Some((PlayerId::new(0), true)));
    }

    #[test]
    fn test_unknown_player_counts_as_eliminated() {
        let state = TurnState::new(2);

        assert!(state.is_eliminated(PlayerId::new(7)));
    }
}
