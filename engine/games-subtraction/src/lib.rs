//! Subtraction puzzle rules.
//!
//! A 3×3 grid of non-negative integers. Each move subtracts 1, 2 or 3 from
//! every cell of one row or column, provided no cell of that line would go
//! below zero. The game is won when any row, column or diagonal reaches all
//! zeros and lost when every column holds a zero without such a line.
//!
//! # Usage
//!
//! ```rust
//! use games_subtraction::{Board, Rules, SubtractionGame};
//!
//! let board = Board::from_rows([[1, 1, 1], [1, 1, 1], [1, 1, 1]]);
//! let mut game = SubtractionGame::from_board(Rules::default(), board);
//!
//! // Subtract 1 from row 0
//! game.apply(0).unwrap();
//! assert!(game.terminal());
//! assert_eq!(game.terminal_reward(), 10.0);
//! ```

mod action;
mod board;
mod env;
mod error;
mod game;
mod position;
mod rules;

pub use action::{Action, Axis, MAX_AMOUNT, NUM_ACTIONS};
pub use board::{Board, BOARD_SIZE, NUM_CELLS};
pub use env::{StepInfo, StepResult, SubtractionEnv};
pub use error::GameError;
pub use game::{Move, PolicyTarget, StateIndex, SubtractionGame};
pub use position::Position;
pub use rules::{Rules, Termination};
