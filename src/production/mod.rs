//! Production scheduling: build orders, progress and unit spawning.

pub mod scheduler;

pub use scheduler::{advance_turn, set_production, spawn_site, ProductionReport};
