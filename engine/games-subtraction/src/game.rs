//! Game record: the board, its move history and the search statistics
//! gathered while playing it.

use engine_core::{ActionMask, Player};
use rand::Rng;

use crate::action::{Action, NUM_ACTIONS};
use crate::board::{Board, NUM_CELLS};
use crate::error::GameError;
use crate::position::Position;
use crate::rules::{Rules, Termination};

/// Visit distribution over the full action space.
pub type PolicyTarget = [f32; NUM_ACTIONS];

/// One history entry: the board as it was before `action` was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub board: Board,
    pub action: Action,
}

/// Which board to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateIndex {
    /// The live board.
    Current,
    /// The board before the move at this history index.
    Ply(usize),
}

/// A single self-play game.
///
/// Grows by `apply` and `store_search_statistics` while being played and is
/// only read once finished.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtractionGame {
    rules: Rules,
    initial: Board,
    board: Board,
    history: Vec<Move>,
    child_visits: Vec<PolicyTarget>,
}

impl SubtractionGame {
    /// Start a game on a freshly drawn board.
    ///
    /// Fails with `InvalidRules` if `rules` does not validate.
    pub fn new<R: Rng + ?Sized>(rules: Rules, rng: &mut R) -> Result<Self, GameError> {
        rules.validate()?;
        Ok(Self::from_board(rules, rules.random_board(rng)?))
    }

    /// Start a game on a given board.
    pub fn from_board(rules: Rules, board: Board) -> Self {
        Self {
            rules,
            initial: board,
            board,
            history: Vec::new(),
            child_visits: Vec::new(),
        }
    }

    /// Draw a fresh board and clear history and search statistics.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let board = self.rules.random_board(rng)?;
        self.initial = board;
        self.board = board;
        self.history.clear();
        self.child_visits.clear();
        Ok(())
    }

    #[inline]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn initial_board(&self) -> &Board {
        &self.initial
    }

    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[inline]
    pub fn child_visits(&self) -> &[PolicyTarget] {
        &self.child_visits
    }

    /// Number of moves played.
    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.board.legal_actions()
    }

    pub fn legal_mask(&self) -> ActionMask {
        self.board.legal_mask()
    }

    pub fn is_legal(&self, action: usize) -> bool {
        Action::from_index(action)
            .map(|a| self.board.is_legal(a))
            .unwrap_or(false)
    }

    /// Apply an action by index, recording the pre-move board.
    pub fn apply(&mut self, action: usize) -> Result<(), GameError> {
        let decoded = Action::from_index(action)?;
        if !self.board.is_legal(decoded) {
            return Err(GameError::InvalidAction {
                action: decoded,
                board: self.board,
            });
        }
        let before = self.board;
        self.board.subtract(decoded);
        self.history.push(Move {
            board: before,
            action: decoded,
        });
        Ok(())
    }

    pub fn termination(&self) -> Option<Termination> {
        self.board.termination()
    }

    pub fn terminal(&self) -> bool {
        self.termination().is_some()
    }

    /// `+bonus` on a win, `-penalty` on a loss, else 0.
    pub fn terminal_reward(&self) -> f32 {
        self.rules.terminal_reward(self.termination())
    }

    /// Player to move at history index `index`.
    #[inline]
    pub fn to_play(&self, index: usize) -> Player {
        Player::from_ply(index)
    }

    /// Player to move on the live board.
    #[inline]
    pub fn current_player(&self) -> Player {
        Player::from_ply(self.history.len())
    }

    /// Outcome from `player`'s point of view: minus everything that player
    /// subtracted, plus the terminal reward if they made the final move.
    pub fn terminal_value(&self, player: Player) -> f32 {
        let spent: u32 = self
            .history
            .iter()
            .enumerate()
            .filter(|(i, _)| Player::from_ply(*i) == player)
            .map(|(_, m)| m.action.amount())
            .sum();

        let mut value = -(spent as f32);
        // The final mover is whoever is not to move now
        if !self.history.is_empty() && self.current_player().other() == player {
            value += self.terminal_reward();
        }
        value
    }

    /// Player with the higher outcome, `None` while the game is running.
    /// Ties go to the first player.
    pub fn winner(&self) -> Option<Player> {
        if !self.terminal() {
            return None;
        }
        let first = self.terminal_value(Player::First);
        let second = self.terminal_value(Player::Second);
        if second > first {
            Some(Player::Second)
        } else {
            Some(Player::First)
        }
    }

    /// Raw board values for the estimator.
    pub fn encode(&self, index: StateIndex) -> Result<[f32; NUM_CELLS], GameError> {
        match index {
            StateIndex::Current => Ok(self.board.encode()),
            StateIndex::Ply(i) => self
                .history
                .get(i)
                .map(|m| m.board.encode())
                .ok_or(GameError::HistoryIndex {
                    index: i,
                    len: self.history.len(),
                }),
        }
    }

    /// Record the root visit distribution of the search that chose the next move.
    pub fn store_search_statistics(&mut self, distribution: PolicyTarget) {
        self.child_visits.push(distribution);
    }

    /// Training target for history index `index`: the outcome for the player
    /// who moved there and the visit distribution recorded for that move.
    pub fn make_target(&self, index: usize) -> Result<(f32, PolicyTarget), GameError> {
        if index >= self.history.len() {
            return Err(GameError::HistoryIndex {
                index,
                len: self.history.len(),
            });
        }
        let policy = self
            .child_visits
            .get(index)
            .copied()
            .ok_or(GameError::MissingSearchStatistics(index))?;
        Ok((self.terminal_value(self.to_play(index)), policy))
    }

    /// Searchable snapshot of the live board.
    pub fn position(&self) -> Position {
        Position::new(self.board, self.history.len())
    }
}
