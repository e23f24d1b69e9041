use engine_core::{ActionMask, Game, Player};

use crate::action::{Action, NUM_ACTIONS};
use crate::board::Board;
use crate::error::GameError;

/// Searchable snapshot of a game: the board plus the number of moves played.
///
/// This is what the tree search clones on every simulation, so it carries
/// no history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub board: Board,
    pub ply: usize,
}

impl Position {
    pub fn new(board: Board, ply: usize) -> Self {
        Self { board, ply }
    }
}

impl Game<NUM_ACTIONS> for Position {
    type Error = GameError;

    fn legal_mask(&self) -> ActionMask {
        self.board.legal_mask()
    }

    fn apply(&mut self, action: usize) -> Result<(), GameError> {
        let decoded = Action::from_index(action)?;
        if !self.board.is_legal(decoded) {
            return Err(GameError::InvalidAction {
                action: decoded,
                board: self.board,
            });
        }
        self.board.subtract(decoded);
        self.ply += 1;
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.board.is_terminal()
    }

    fn to_play(&self) -> Player {
        Player::from_ply(self.ply)
    }

    fn observation(&self) -> Vec<f32> {
        self.board.encode().to_vec()
    }

    fn moves_played(&self) -> usize {
        self.ply
    }
}
