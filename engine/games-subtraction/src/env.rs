//! Step-based environment session over the same rules.
//!
//! Unlike [`SubtractionGame`](crate::SubtractionGame) this keeps no history
//! and pays a reward on every step: minus the amount subtracted, plus the
//! terminal reward when the step ends the episode.

use rand::Rng;

use crate::action::Action;
use crate::board::Board;
use crate::error::GameError;
use crate::rules::{Rules, Termination};

/// Side information returned with every reset and step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInfo {
    /// Terminal pattern reached, if any.
    pub termination: Option<Termination>,
    /// The move cap ended the episode without a terminal pattern.
    pub truncated: bool,
    pub moves: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub board: Board,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone)]
pub struct SubtractionEnv {
    rules: Rules,
    board: Board,
    moves: u32,
    done: bool,
}

impl SubtractionEnv {
    /// Create a session and draw its first board.
    pub fn new<R: Rng + ?Sized>(rules: Rules, rng: &mut R) -> Result<Self, GameError> {
        rules.validate()?;
        let board = rules.random_board(rng)?;
        Ok(Self {
            rules,
            board,
            moves: 0,
            done: false,
        })
    }

    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(Board, StepInfo), GameError> {
        self.board = self.rules.random_board(rng)?;
        self.moves = 0;
        self.done = false;
        Ok((self.board, StepInfo::default()))
    }

    #[inline]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_legal_move(&self, action: usize) -> bool {
        Action::from_index(action)
            .map(|a| self.board.is_legal(a))
            .unwrap_or(false)
    }

    pub fn step(&mut self, action: usize) -> Result<StepResult, GameError> {
        if self.done {
            return Err(GameError::EpisodeFinished);
        }
        let decoded = Action::from_index(action)?;
        if !self.board.is_legal(decoded) {
            return Err(GameError::InvalidAction {
                action: decoded,
                board: self.board,
            });
        }

        self.board.subtract(decoded);
        self.moves += 1;

        let termination = self.board.termination();
        let truncated = termination.is_none() && self.moves >= self.rules.max_moves;
        let reward = -(decoded.amount() as f32) + self.rules.terminal_reward(termination);
        self.done = termination.is_some() || truncated;

        Ok(StepResult {
            board: self.board,
            reward,
            done: self.done,
            info: StepInfo {
                termination,
                truncated,
                moves: self.moves,
            },
        })
    }
}
