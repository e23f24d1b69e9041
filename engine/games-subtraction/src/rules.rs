use rand::Rng;

use crate::board::Board;
use crate::error::GameError;

/// Which terminal pattern ended the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// A row, column or diagonal reached all zeros.
    Win,
    /// Every column holds a zero and no line is cleared.
    Loss,
}

/// Reward constants and board generation range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    /// Added to the final mover's outcome on a win.
    pub bonus: f32,
    /// Subtracted from the final mover's outcome on a loss.
    pub penalty: f32,
    /// Move cap for self-play and environment sessions.
    pub max_moves: u32,
    /// Inclusive lower bound for fresh cells.
    pub board_min: u32,
    /// Exclusive upper bound for fresh cells.
    pub board_max: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            bonus: 10.0,
            penalty: 10.0,
            max_moves: 300,
            board_min: 1,
            board_max: 100,
        }
    }
}

impl Rules {
    /// `+bonus` for a win, `-penalty` for a loss, 0 otherwise.
    pub fn terminal_reward(&self, termination: Option<Termination>) -> f32 {
        match termination {
            Some(Termination::Win) => self.bonus,
            Some(Termination::Loss) => -self.penalty,
            None => 0.0,
        }
    }

    pub fn random_board<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Board, GameError> {
        Board::random(rng, self.board_min, self.board_max)
    }

    /// Fresh boards must be non-empty ranges of positive cells so they are never terminal.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.board_min == 0 {
            return Err(GameError::InvalidRules(
                "board_min must be at least 1".into(),
            ));
        }
        if self.board_min >= self.board_max {
            return Err(GameError::InvalidRules(format!(
                "board range {}..{} is empty",
                self.board_min, self.board_max
            )));
        }
        if !self.bonus.is_finite() || !self.penalty.is_finite() {
            return Err(GameError::InvalidRules(
                "bonus and penalty must be finite".into(),
            ));
        }
        Ok(())
    }
}
