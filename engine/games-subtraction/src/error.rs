use thiserror::Error;

use crate::action::{Action, NUM_ACTIONS};
use crate::board::Board;

/// Errors raised by the puzzle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("action index {0} is outside 0..{NUM_ACTIONS}")]
    ActionOutOfRange(usize),

    #[error("illegal action {action} on board {board}")]
    InvalidAction { action: Action, board: Board },

    #[error("history index {index} out of range for a game of {len} moves")]
    HistoryIndex { index: usize, len: usize },

    #[error("no search statistics recorded for move {0}")]
    MissingSearchStatistics(usize),

    #[error("episode already finished, call reset first")]
    EpisodeFinished,

    #[error("invalid rules: {0}")]
    InvalidRules(String),
}
