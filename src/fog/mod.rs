//! Fog of war: per-player visibility derived from unit and city positions.

pub mod visibility;

pub use visibility::{refresh, vision_mask, Visibility, VisibilityMap};
