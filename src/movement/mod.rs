//! Movement and legality: validate, classify and apply unit moves.

pub mod legality;

pub use legality::{apply, propose_move, MoveOutcome};
