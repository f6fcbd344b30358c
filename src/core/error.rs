//! Error types shared across the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::EntityRef;

/// Why a command was refused. State is unchanged whenever one is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    OutOfBounds,
    WrongTerrain,
    InsufficientMovement,
    FriendlyOccupied,
    NotYourTurn,
    WrongMode,
    NotOwned,
    NoUnitSelected,
    Unreachable,
    CannotCapture,
    SameTile,
    ClassUnavailable,
    GameOver,
}

impl RejectReason {
    /// Stable snake_case code for input layers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            RejectReason::OutOfBounds => "out_of_bounds",
            RejectReason::WrongTerrain => "wrong_terrain",
            RejectReason::InsufficientMovement => "insufficient_movement",
            RejectReason::FriendlyOccupied => "friendly_occupied",
            RejectReason::NotYourTurn => "not_your_turn",
            RejectReason::WrongMode => "wrong_mode",
            RejectReason::NotOwned => "not_owned",
            RejectReason::NoUnitSelected => "no_unit_selected",
            RejectReason::Unreachable => "unreachable",
            RejectReason::CannotCapture => "cannot_capture",
            RejectReason::SameTile => "same_tile",
            RejectReason::ClassUnavailable => "class_unavailable",
            RejectReason::GameOver => "game_over",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Recoverable command failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("illegal command: {0}")]
    Illegal(RejectReason),
    #[error("entity not found: {0}")]
    EntityNotFound(EntityRef),
}

impl CommandError {
    /// The rejection reason, if this is an illegal-command error.
    #[must_use]
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            CommandError::Illegal(reason) => Some(*reason),
            CommandError::EntityNotFound(_) => None,
        }
    }
}

impl From<RejectReason> for CommandError {
    fn from(reason: RejectReason) -> Self {
        CommandError::Illegal(reason)
    }
}

/// World generation could not satisfy its constraints.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("land fraction outside bounds after {attempts} attempts")]
    LandFraction { attempts: u32 },
    #[error("placed {placed} cities, at least {required} required")]
    TooFewCities { placed: u32, required: u32 },
    #[error("grid {width}x{height} is too small")]
    GridTooSmall { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal failure building a game.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Snapshot import/export failure. A failed import never touches a running engine.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encode error: {0}")]
    Encode(bincode::Error),
    #[error("snapshot decode error: {0}")]
    Decode(bincode::Error),
    #[error("snapshot version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
