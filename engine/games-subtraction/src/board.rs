//! The 3×3 grid and its rules.

use std::fmt;

use engine_core::ActionMask;
use rand::Rng;

use crate::action::{Action, Axis};
use crate::error::GameError;
use crate::rules::Termination;

/// Cells per side.
pub const BOARD_SIZE: usize = 3;

/// Total cells, also the length of an encoded board.
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// 3×3 grid of non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board([[u32; BOARD_SIZE]; BOARD_SIZE]);

impl Board {
    pub const fn from_rows(rows: [[u32; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self(rows)
    }

    /// Board with every cell drawn uniformly from `min..max`.
    ///
    /// Fails with `InvalidRules` when the range is empty.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> Result<Self, GameError> {
        if min >= max {
            return Err(GameError::InvalidRules(format!(
                "board range {}..{} is empty",
                min, max
            )));
        }
        let mut rows = [[0; BOARD_SIZE]; BOARD_SIZE];
        for cell in rows.iter_mut().flatten() {
            *cell = rng.gen_range(min..max);
        }
        Ok(Self(rows))
    }

    #[inline]
    pub fn rows(&self) -> &[[u32; BOARD_SIZE]; BOARD_SIZE] {
        &self.0
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> u32 {
        self.0[row][col]
    }

    /// The three cells targeted by a row or column.
    pub fn line(&self, axis: Axis, line: usize) -> [u32; BOARD_SIZE] {
        match axis {
            Axis::Row => self.0[line],
            Axis::Column => [self.0[0][line], self.0[1][line], self.0[2][line]],
        }
    }

    /// An action is legal when every cell of its line is at least `amount`.
    /// Amounts start at 1, so a line holding a zero is never legal.
    pub fn is_legal(&self, action: Action) -> bool {
        self.line(action.axis(), action.line())
            .iter()
            .all(|&cell| cell >= action.amount())
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        Action::all().filter(|a| self.is_legal(*a)).collect()
    }

    pub fn legal_mask(&self) -> ActionMask {
        Action::all()
            .filter(|a| self.is_legal(*a))
            .map(Action::index)
            .collect()
    }

    /// Subtract along the action's line. Callers check legality first.
    pub(crate) fn subtract(&mut self, action: Action) {
        debug_assert!(self.is_legal(action));
        for i in 0..BOARD_SIZE {
            let cell = match action.axis() {
                Axis::Row => &mut self.0[action.line()][i],
                Axis::Column => &mut self.0[i][action.line()],
            };
            *cell -= action.amount();
        }
    }

    /// WIN when any row, column or diagonal is all zero. Otherwise LOSS
    /// when every column holds at least one zero.
    pub fn termination(&self) -> Option<Termination> {
        let zero_line = |cells: [u32; BOARD_SIZE]| cells.iter().all(|&c| c == 0);

        let win = (0..BOARD_SIZE).any(|i| {
            zero_line(self.line(Axis::Row, i)) || zero_line(self.line(Axis::Column, i))
        }) || zero_line([self.0[0][0], self.0[1][1], self.0[2][2]])
            || zero_line([self.0[0][2], self.0[1][1], self.0[2][0]]);
        if win {
            return Some(Termination::Win);
        }

        let every_column_blocked = (0..BOARD_SIZE)
            .all(|col| self.line(Axis::Column, col).iter().any(|&c| c == 0));
        if every_column_blocked {
            return Some(Termination::Loss);
        }

        None
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.termination().is_some()
    }

    /// Row-major raw cell values.
    pub fn encode(&self) -> [f32; NUM_CELLS] {
        let mut out = [0.0; NUM_CELLS];
        for (slot, &cell) in out.iter_mut().zip(self.0.iter().flatten()) {
            *slot = cell as f32;
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self
            .0
            .iter()
            .map(|r| format!("[{}, {}, {}]", r[0], r[1], r[2]))
            .collect();
        write!(f, "[{}]", rows.join(", "))
    }
}
