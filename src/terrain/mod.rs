//! Terrain: the static tile grid and its seeded generator.

pub mod generator;
pub mod grid;

pub use generator::{generate, generate_with_rng, GeneratedWorld};
pub use grid::{Terrain, Tile, TileGrid};
