//! Turn and game state: the engine, its command surface and setup.
//!
//! - `Engine`: owns the grid, registry, fog and random stream of one game
//! - `Command` / `CommandEffect`: the input layer's vocabulary
//! - `TurnState`: active player, mode, counter and result
//! - `WorldBuilder`: hand-authored worlds for scenarios and tests

pub mod command;
pub mod engine;
pub mod setup;
pub mod state;

pub use command::{Command, CommandEffect, CommandRecord, TurnSummary};
pub use engine::{CommandOutcome, Engine, PlayerSummary};
pub use setup::WorldBuilder;
pub use state::{GameResult, Mode, TurnState};
