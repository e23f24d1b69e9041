//! Core traits and types shared by the game engine and the search.
//!
//! - `Game`: position contract the MCTS engine searches over
//! - `ActionMask`: packed set of legal action indices
//! - `Player`: alternating move slot used for value bookkeeping

pub mod mask;
pub mod typed;

// Re-export main types for convenience
pub use mask::ActionMask;
pub use typed::{Game, Player};
