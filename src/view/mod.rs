//! Read-only per-player views for renderers and commanders.

pub mod player_view;

pub use player_view::{CitySighting, PlayerView, UnitSighting};
