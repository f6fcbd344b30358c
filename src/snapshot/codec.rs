//! Whole-engine snapshots.
//!
//! A snapshot captures everything needed to continue a game bit-identically:
//! config, grid, registry records, per-player visibility, turn state, the
//! command log and the random stream position. Derived registry indexes are
//! not stored; they are rebuilt and checked on import.
//!
//! Import decodes into a fresh engine and validates it before handing it
//! back, so a bad blob can never disturb a running game.

use std::path::Path;

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{EngineConfig, GameRng, GameRngState, PlayerMap, SnapshotError};
use crate::fog::VisibilityMap;
use crate::registry::EntityRegistry;
use crate::terrain::TileGrid;
use crate::turn::{CommandRecord, Engine, Mode, TurnState};

/// Snapshot format version. Bumped on any layout change.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Every piece of engine state, in serializable form.
///
/// `version` must stay the first field: import peeks at it before decoding
/// the rest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    pub config: EngineConfig,
    pub grid: TileGrid,
    pub registry: EntityRegistry,
    pub fog: PlayerMap<VisibilityMap>,
    pub turn: TurnState,
    pub log: Vector<CommandRecord>,
    pub rng: GameRngState,
}

/// Encoded snapshot bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotBlob(pub Vec<u8>);

impl SnapshotBlob {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for SnapshotBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl EngineSnapshot {
    pub fn encode(&self) -> Result<SnapshotBlob, SnapshotError> {
        bincode::serialize(self)
            .map(SnapshotBlob)
            .map_err(SnapshotError::Encode)
    }

    /// Decode, rejecting other format versions before reading the body.
    pub fn decode(blob: &SnapshotBlob) -> Result<Self, SnapshotError> {
        let found: u32 = bincode::deserialize(blob.as_bytes()).map_err(SnapshotError::Decode)?;
        if found != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found,
                expected: SNAPSHOT_VERSION,
            });
        }
        bincode::deserialize(blob.as_bytes()).map_err(SnapshotError::Decode)
    }
}

impl Engine {
    /// Copy the current state into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            config: self.config().clone(),
            grid: self.grid().clone(),
            registry: self.registry().clone(),
            fog: self.visibility_maps().clone(),
            turn: self.turn_state().clone(),
            log: self.command_log().clone(),
            rng: self.rng_state(),
        }
    }

    pub fn export_state(&self) -> Result<SnapshotBlob, SnapshotError> {
        let blob = self.snapshot().encode()?;
        debug!(bytes = blob.len(), turn = self.turn_number(), "state exported");
        Ok(blob)
    }

    /// Decode and validate a blob into a new engine.
    pub fn import_state(blob: &SnapshotBlob) -> Result<Engine, SnapshotError> {
        Self::from_snapshot(EngineSnapshot::decode(blob)?)
    }

    /// Validate a decoded snapshot into a new engine.
    pub fn from_snapshot(snapshot: EngineSnapshot) -> Result<Engine, SnapshotError> {
        let EngineSnapshot {
            version,
            config,
            grid,
            mut registry,
            fog,
            turn,
            log,
            rng,
        } = snapshot;

        if version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: version,
                expected: SNAPSHOT_VERSION,
            });
        }
        config
            .validate()
            .map_err(|err| SnapshotError::Inconsistent(err.to_string()))?;
        if (grid.width(), grid.height()) != (config.map.width, config.map.height) {
            return Err(inconsistent("grid size differs from config"));
        }
        if !grid.is_consistent() {
            return Err(inconsistent("grid cells do not cover its area"));
        }

        registry.rebuild_indexes();
        registry
            .validate(&grid, &config.units, config.players)
            .map_err(SnapshotError::Inconsistent)?;

        if fog.player_count() != config.players {
            return Err(inconsistent("visibility maps do not match player count"));
        }
        if fog.iter().any(|(_, map)| !map.fits(&grid)) {
            return Err(inconsistent("visibility map size differs from grid"));
        }

        check_turn(&turn, &registry, config.players)?;

        if log.iter().enumerate().any(|(i, record)| record.sequence != i as u64) {
            return Err(inconsistent("command log out of sequence"));
        }

        let rng = GameRng::from_state(&rng);
        let engine = Engine::from_parts(config, grid, registry, rng, turn, log, Some(fog));
        info!(turn = engine.turn_number(), active = %engine.active_player(), "state imported");
        Ok(engine)
    }

    /// Export to a file.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let blob = self.export_state()?;
        std::fs::write(path, blob.as_bytes())?;
        Ok(())
    }

    /// Import from a file written by `save_to_path`.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Engine, SnapshotError> {
        let bytes = std::fs::read(path)?;
        Self::import_state(&SnapshotBlob(bytes))
    }
}

fn inconsistent(message: &str) -> SnapshotError {
    SnapshotError::Inconsistent(message.to_string())
}

fn check_turn(turn: &TurnState, registry: &EntityRegistry, players: usize) -> Result<(), SnapshotError> {
    if turn.player_count() != players {
        return Err(inconsistent("elimination flags do not match player count"));
    }
    if turn.active.index() >= players {
        return Err(inconsistent("active player out of range"));
    }
    if !turn.is_over() && turn.is_eliminated(turn.active) {
        return Err(inconsistent("active player is eliminated"));
    }
    for (player, &out) in turn.eliminated.iter() {
        if out && (registry.cities_of(player).next().is_some() || registry.units_of(player).next().is_some()) {
            return Err(inconsistent("eliminated player still holds entities"));
        }
    }
    match turn.mode {
        Mode::Orders => {}
        Mode::Move { unit } => {
            if registry.unit(unit).map_or(true, |u| u.owner != turn.active) {
                return Err(inconsistent("selected unit missing or not owned"));
            }
        }
        Mode::Edit { city } => {
            if registry.city(city).map_or(true, |c| !c.is_owned_by(turn.active)) {
                return Err(inconsistent("edited city missing or not owned"));
            }
        }
    }
    Ok(())
}
