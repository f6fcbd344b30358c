//! Entity registry: single source of truth for units and cities.

pub mod entities;

pub use entities::EntityRegistry;
