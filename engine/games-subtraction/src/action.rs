//! Action encoding.
//!
//! The 18 actions enumerate `(axis, line, amount)` as
//! `index = axis * 9 + line * 3 + (amount - 1)`, rows before columns.

use std::fmt;

use crate::error::GameError;

/// Size of the action space.
pub const NUM_ACTIONS: usize = 18;

/// Number of distinct subtraction amounts per line.
pub const MAX_AMOUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

/// Subtract `amount` from every cell of one row or column.
///
/// Only [`Action::new`] and [`Action::from_index`] build one, so `line` is
/// always in `0..3` and `amount` in `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    axis: Axis,
    line: usize,
    amount: u32,
}

impl Action {
    /// Returns `None` when `line` or `amount` is out of range.
    pub fn new(axis: Axis, line: usize, amount: u32) -> Option<Self> {
        if line >= 3 || amount == 0 || amount > MAX_AMOUNT {
            return None;
        }
        Some(Self { axis, line, amount })
    }

    /// Decode an action index.
    pub fn from_index(index: usize) -> Result<Self, GameError> {
        if index >= NUM_ACTIONS {
            return Err(GameError::ActionOutOfRange(index));
        }
        let axis = if index < 9 { Axis::Row } else { Axis::Column };
        Ok(Self {
            axis,
            line: (index % 9) / 3,
            amount: (index % 3) as u32 + 1,
        })
    }

    #[inline]
    pub fn axis(self) -> Axis {
        self.axis
    }

    /// Row or column index in `0..3`.
    #[inline]
    pub fn line(self) -> usize {
        self.line
    }

    /// Amount in `1..=3`.
    #[inline]
    pub fn amount(self) -> u32 {
        self.amount
    }

    /// Encode back into `0..18`.
    #[inline]
    pub fn index(self) -> usize {
        let axis = match self.axis {
            Axis::Row => 0,
            Axis::Column => 1,
        };
        axis * 9 + self.line * 3 + (self.amount as usize - 1)
    }

    /// Every action in index order.
    pub fn all() -> impl Iterator<Item = Action> {
        (0..NUM_ACTIONS).filter_map(|index| Action::from_index(index).ok())
    }
}

impl TryFrom<usize> for Action {
    type Error = GameError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Action::from_index(index)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::Row => "row",
            Axis::Column => "col",
        };
        write!(f, "{} {} -{}", axis, self.line, self.amount)
    }
}
