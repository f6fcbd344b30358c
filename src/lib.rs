//! # rust-empire
//!
//! A deterministic engine for turn-based strategic war simulation on a
//! tile grid, in the tradition of the classic Empire game.
//!
//! ## Design Principles
//!
//! 1. **One Owner of State**: the `Engine` owns the grid, every unit and
//!    city, per-player fog and the turn state. Collaborators read settled
//!    views between commands and never mutate directly.
//!
//! 2. **All-or-Nothing Commands**: a command either completes or is
//!    rejected with a specific reason code, leaving state untouched.
//!
//! 3. **Reproducible**: all randomness flows through one seeded `GameRng`.
//!    The seed plus the ordered command log replays a whole game.
//!
//! 4. **Data Over Hierarchy**: unit behavior comes from a `ClassTable` of
//!    descriptors, not from per-class types.
//!
//! ## Modules
//!
//! - `core`: ids, players, coordinates, RNG, configuration, errors
//! - `terrain`: tile grid and world generation
//! - `units`: unit classes, unit and city records
//! - `registry`: entity storage with coordinate and owner indexes
//! - `fog`: per-player visibility
//! - `movement`: move legality and application
//! - `combat`: probabilistic engagement resolution
//! - `production`: city build orders and spawning
//! - `turn`: the engine, commands, turn state and world setup
//! - `view`: read-only per-player views and glyph rendering
//! - `ai`: pluggable commanders
//! - `snapshot`: whole-engine export and import
//!
//! ## Example
//!
//! ```
//! use rust_empire::{Engine, EngineConfig, RaiderCommander};
//!
//! let config = EngineConfig::default().with_seed(7);
//! let mut engine = Engine::new(config).unwrap();
//! let mut raider = RaiderCommander;
//!
//! for _ in 0..4 {
//!     engine.play_commander_turn(&mut raider);
//! }
//! assert_eq!(engine.turn_number(), 2);
//! ```

pub mod ai;
pub mod combat;
pub mod core;
pub mod fog;
pub mod movement;
pub mod production;
pub mod registry;
pub mod snapshot;
pub mod terrain;
pub mod turn;
pub mod units;
pub mod view;

// Re-export commonly used types
pub use crate::core::{
    CityId, CommandError, Coord, EngineConfig, GameRng, GameRngState, PlayerId, PlayerMap,
    RejectReason, SetupError, SnapshotError, UnitId,
};

pub use crate::terrain::{Terrain, Tile, TileGrid};

pub use crate::units::{City, ClassStats, ClassTable, Domain, Unit, UnitClass};

pub use crate::registry::EntityRegistry;

pub use crate::fog::{Visibility, VisibilityMap};

pub use crate::movement::MoveOutcome;

pub use crate::combat::{CombatOutcome, Victor};

pub use crate::turn::{
    Command, CommandEffect, CommandOutcome, Engine, GameResult, Mode, TurnSummary, WorldBuilder,
};

pub use crate::view::PlayerView;

pub use crate::ai::{Commander, IdleCommander, RaiderCommander};

pub use crate::snapshot::{EngineSnapshot, SnapshotBlob};
