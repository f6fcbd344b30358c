//! Combat: clamped win probabilities and seeded resolution.

pub mod resolver;

pub use resolver::{engagement_odds, resolve, win_probability, CombatOutcome, Victor};
