//! Commands accepted by the engine and the effects they report.

use serde::{Deserialize, Serialize};

use super::state::GameResult;
use crate::core::{CityId, Coord, PlayerId, UnitId};
use crate::production::ProductionReport;
use crate::units::UnitClass;

/// An input-layer command. Always acts for the active player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    SelectUnit(UnitId),
    EditCity(CityId),
    Cancel,
    /// Move the selected unit.
    MoveUnit(Coord),
    SetProduction {
        city: CityId,
        class: Option<UnitClass>,
    },
    EndTurn,
}

/// An accepted command in the engine's log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub player: PlayerId,
    pub command: Command,

    /// Turn counter when the command was accepted.
    pub turn: u32,

    /// Position in the whole-game log (0-based).
    pub sequence: u64,
}

impl CommandRecord {
    #[must_use]
    pub fn new(player: PlayerId, command: Command, turn: u32, sequence: u64) -> Self {
        Self {
            player,
            command,
            turn,
            sequence,
        }
    }
}

/// What ending a turn did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnSummary {
    pub ended: PlayerId,

    /// Player now to move; `None` once the game is over.
    pub next: Option<PlayerId>,

    /// Turn counter after the transition.
    pub turn: u32,

    pub production: ProductionReport,

    /// Air units lost to empty tanks.
    pub fuel_losses: Vec<UnitId>,

    /// Players eliminated by this end of turn.
    pub eliminated: Vec<PlayerId>,

    pub result: Option<GameResult>,
}

/// Success report for an accepted command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandEffect {
    Selected {
        unit: UnitId,
    },
    Editing {
        city: CityId,
    },
    Cancelled,
    Moved {
        unit: UnitId,
        from: Coord,
        to: Coord,
        moves_left: u32,
    },
    Captured {
        unit: UnitId,
        city: CityId,
        previous_owner: Option<PlayerId>,
        at: Coord,
    },
    Engaged {
        attacker: UnitId,
        defender: UnitId,
        staging: Coord,
        attacker_won: bool,
        probability: f64,
        casualty: UnitId,
    },
    ProductionSet {
        city: CityId,
        class: Option<UnitClass>,
    },
    TurnEnded(TurnSummary),
}
