//! AI hook: commanders that plan a turn from a player's view.
//!
//! - `Commander`: the planning trait the engine drives
//! - `IdleCommander`: ends every turn
//! - `RaiderCommander`: simple expansion for self-play runs

pub mod commander;

pub use commander::{Commander, IdleCommander, RaiderCommander};
