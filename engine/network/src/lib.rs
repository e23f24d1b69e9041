//! Learned policy/value estimator for the subtraction puzzle.
//!
//! - [`PolicyValueNet`]: candle network in a `flat` (MLP) or `conv`
//!   parameterisation, mapping a 9-cell board to one value and 18 logits
//! - [`NetworkSnapshot`]: frozen copy of the parameters, usable as an MCTS
//!   [`Evaluator`](mcts::Evaluator) from any number of threads
//! - [`Learner`]: AdamW updates with a step learning-rate schedule
//!
//! # Usage
//!
//! ```rust
//! use mcts::Evaluator;
//! use network::{Learner, LearnerConfig, NetworkConfig};
//!
//! let learner = Learner::new(NetworkConfig::default(), LearnerConfig::default()).unwrap();
//! let snapshot = learner.snapshot(0).unwrap();
//!
//! let result = snapshot.evaluate(&[5.0; 9]).unwrap();
//! assert_eq!(result.logits.len(), 18);
//! ```

mod error;
mod learner;
mod model;
mod snapshot;

pub use error::NetworkError;
pub use learner::{
    smooth_l1_loss, soft_cross_entropy, Learner, LearnerConfig, LossStats, TrainingSample,
};
pub use model::{NetworkConfig, NetworkKind, PolicyValueNet};
pub use snapshot::NetworkSnapshot;
