//! Monte Carlo Tree Search (MCTS) implementation for AlphaZero-style self-play.
//!
//! This crate provides a game-agnostic MCTS that works with any position
//! implementing the `engine-core` [`Game`](engine_core::Game) trait over a
//! fixed action space of `A` actions.
//!
//! # Overview
//!
//! Each simulation consists of four phases:
//!
//! 1. **Selection**: Descend from the root choosing the child with the
//!    highest UCB score, applying its action to a clone of the root position
//! 2. **Evaluation**: Ask the [`Evaluator`] for a value and policy logits
//! 3. **Expansion**: Add one child per legal action with softmax priors.
//!    Terminal positions are evaluated but never expanded
//! 4. **Backpropagation**: Every node on the path gains a visit and adds the
//!    value if its player to move matches the leaf's, `1 - value` otherwise
//!
//! # Usage
//!
//! ```rust
//! use games_subtraction::{Board, Position};
//! use mcts::{run_mcts, MctsConfig, UniformEvaluator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let position = Position::new(Board::from_rows([[4, 7, 2], [9, 3, 5], [6, 8, 1]]), 0);
//! let evaluator = UniformEvaluator::new();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//!
//! let result = run_mcts(&position, &evaluator, MctsConfig::for_testing(), &mut rng).unwrap();
//! assert_eq!(result.visit_counts.iter().sum::<u32>(), 50);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `num_simulations`: Number of simulations per search (default: 8)
//! - `pb_c_base`, `pb_c_init`: Exploration constants of the UCB formula
//! - `dirichlet_alpha`, `root_exploration_fraction`: Root noise
//! - `num_sampling_moves`: Opening moves sampled from visit counts instead of taking the argmax

pub mod config;
pub mod evaluator;
pub mod node;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::MctsConfig;
pub use evaluator::{masked_softmax, EvalResult, Evaluator, EvaluatorError, UniformEvaluator};
pub use node::{MctsNode, NodeId};
pub use search::{run_mcts, MctsSearch, SearchError, SearchResult, SearchStats};
pub use tree::{MctsTree, TreeStats};
