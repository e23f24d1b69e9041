//! Typed Game trait used by the search engine.
//!
//! A `Game` is a cheap-to-clone position with a fixed discrete action space
//! of `A` actions. The search clones the root position once per simulation
//! and applies actions to the clone, so implementations should keep the
//! searchable state small.

use std::fmt;

use crate::mask::ActionMask;

/// One of the two alternating move slots.
///
/// Even plies belong to `First`, odd plies to `Second`. Single-player
/// puzzles still alternate slots so that value bookkeeping can tell
/// consecutive moves apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Player to move at the given ply (number of moves already played).
    #[inline]
    pub fn from_ply(ply: usize) -> Self {
        if ply % 2 == 0 {
            Player::First
        } else {
            Player::Second
        }
    }

    /// 0 for `First`, 1 for `Second`.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Position contract for tree search over `A` discrete actions.
///
/// # Example
///
/// ```rust
/// # use engine_core::{ActionMask, Game, Player};
/// #[derive(Debug, Clone)]
/// struct Countdown(u32);
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("illegal")]
/// struct Illegal;
///
/// impl Game<2> for Countdown {
///     type Error = Illegal;
///     fn legal_mask(&self) -> ActionMask {
///         if self.0 == 0 { ActionMask::EMPTY } else { ActionMask::full(2) }
///     }
///     fn apply(&mut self, action: usize) -> Result<(), Illegal> {
///         self.0 = self.0.checked_sub(action as u32 + 1).ok_or(Illegal)?;
///         Ok(())
///     }
///     fn is_terminal(&self) -> bool { self.0 == 0 }
///     fn to_play(&self) -> Player { Player::First }
///     fn observation(&self) -> Vec<f32> { vec![self.0 as f32] }
///     fn moves_played(&self) -> usize { 0 }
/// }
///
/// let mut game = Countdown(3);
/// game.apply(1).unwrap();
/// assert_eq!(game.0, 1);
/// ```
pub trait Game<const A: usize>: Clone + Send + Sync + fmt::Debug {
    /// Error returned when an action cannot be applied.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Bit mask of the actions that may be applied in this position.
    fn legal_mask(&self) -> ActionMask;

    /// Apply an action in place.
    fn apply(&mut self, action: usize) -> Result<(), Self::Error>;

    /// Whether the position has reached a terminal pattern.
    fn is_terminal(&self) -> bool;

    /// Player whose move it is.
    fn to_play(&self) -> Player;

    /// Estimator input for the current position.
    fn observation(&self) -> Vec<f32>;

    /// Number of moves applied since the start of the game.
    fn moves_played(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_alternates_by_ply() {
        assert_eq!(Player::from_ply(0), Player::First);
        assert_eq!(Player::from_ply(1), Player::Second);
        assert_eq!(Player::from_ply(2), Player::First);
        assert_eq!(Player::from_ply(7), Player::Second);
    }

    #[test]
    fn test_player_index_and_other() {
        assert_eq!(Player::First.index(), 0);
        assert_eq!(Player::Second.index(), 1);
        assert_eq!(Player::First.other(), Player::Second);
        assert_eq!(Player::Second.other().other(), Player::Second);
        assert_eq!(Player::Second.to_string(), "P1");
    }
}
