//! Persistence: whole-engine snapshot export and import.

pub mod codec;

pub use codec::{EngineSnapshot, SnapshotBlob, SNAPSHOT_VERSION};
