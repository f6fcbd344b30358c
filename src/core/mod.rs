//! Core engine types: ids, players, coordinates, RNG, configuration, errors.
//!
//! Everything here is independent of the game rules; the other modules
//! build on these types and receive tunables through `EngineConfig` rather
//! than hard-coding them.

pub mod config;
pub mod coord;
pub mod error;
pub mod ids;
pub mod player;
pub mod rng;

pub use config::{CombatConfig, EngineConfig, MapConfig, Matchup, SetupConfig};
pub use coord::{Coord, ORTHOGONAL_OFFSETS, RING_OFFSETS};
pub use error::{
    CommandError, ConfigError, GenerationError, RejectReason, SetupError, SnapshotError,
};
pub use ids::{CityId, EntityRef, UnitId};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
