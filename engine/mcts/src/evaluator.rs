//! Evaluator trait for position evaluation.
//!
//! The evaluator maps an observation to a value estimate and one policy
//! logit per action. In self-play this is the learned network; for tests
//! and bootstrapping a uniform evaluator is provided.

use engine_core::ActionMask;
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid observation: expected {expected} values, got {actual}")]
    InvalidObservation { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    ModelError(String),
}

/// Result of evaluating a position.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult<const A: usize> {
    /// Unnormalised policy logits, one per action.
    pub logits: [f32; A],

    /// Value estimate for the player to move.
    pub value: f32,
}

/// Trait for position evaluators.
pub trait Evaluator<const A: usize>: Send + Sync {
    /// Evaluate a single observation.
    fn evaluate(&self, obs: &[f32]) -> Result<EvalResult<A>, EvaluatorError>;

    /// Batch evaluate multiple observations.
    /// Default implementation calls evaluate() in a loop.
    fn evaluate_batch(
        &self,
        observations: &[&[f32]],
    ) -> Result<Vec<EvalResult<A>>, EvaluatorError> {
        observations.iter().map(|obs| self.evaluate(obs)).collect()
    }
}

impl<const A: usize, E: Evaluator<A> + ?Sized> Evaluator<A> for std::sync::Arc<E> {
    fn evaluate(&self, obs: &[f32]) -> Result<EvalResult<A>, EvaluatorError> {
        (**self).evaluate(obs)
    }

    fn evaluate_batch(
        &self,
        observations: &[&[f32]],
    ) -> Result<Vec<EvalResult<A>>, EvaluatorError> {
        (**self).evaluate_batch(observations)
    }
}

/// Evaluator with equal logits for every action and a fixed value.
/// Useful for testing MCTS without a model.
#[derive(Debug, Clone)]
pub struct UniformEvaluator {
    value: f32,
}

impl Default for UniformEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformEvaluator {
    /// Neutral evaluator: value 0.5, halfway between the two backup branches.
    pub fn new() -> Self {
        Self { value: 0.5 }
    }

    pub fn with_value(value: f32) -> Self {
        Self { value }
    }
}

impl<const A: usize> Evaluator<A> for UniformEvaluator {
    fn evaluate(&self, _obs: &[f32]) -> Result<EvalResult<A>, EvaluatorError> {
        Ok(EvalResult {
            logits: [0.0; A],
            value: self.value,
        })
    }
}

/// Softmax of `logits` restricted to the actions in `legal_mask`.
///
/// Illegal actions get probability 0. Returns `None` when the mask selects
/// no action or the logits do not produce a finite distribution.
pub fn masked_softmax<const A: usize>(
    logits: &[f32; A],
    legal_mask: ActionMask,
) -> Option<[f32; A]> {
    let max_logit = legal_mask
        .iter()
        .filter(|&a| a < A)
        .map(|a| logits[a])
        .fold(f32::NEG_INFINITY, f32::max);

    if !max_logit.is_finite() {
        return None;
    }

    let mut probs = [0.0f32; A];
    let mut exp_sum = 0.0;
    for action in legal_mask.iter().filter(|&a| a < A) {
        let exp_val = (logits[action] - max_logit).exp();
        probs[action] = exp_val;
        exp_sum += exp_val;
    }

    if !(exp_sum > 0.0 && exp_sum.is_finite()) {
        return None;
    }
    for p in &mut probs {
        *p /= exp_sum;
    }
    Some(probs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_uniform_evaluator() {
        let eval = UniformEvaluator::new();
        let result: EvalResult<9> = eval.evaluate(&[0.0; 9]).unwrap();

        assert!(result.logits.iter().all(|l| l.abs() < 1e-6));
        assert!((result.value - 0.5).abs() < 1e-6);

        let fixed: EvalResult<9> = UniformEvaluator::with_value(0.9).evaluate(&[]).unwrap();
        assert!((fixed.value - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_arc_evaluator_delegates() {
        let eval = Arc::new(UniformEvaluator::with_value(0.25));
        let observations: [&[f32]; 2] = [&[1.0], &[2.0]];
        let batch: Vec<EvalResult<3>> = eval.evaluate_batch(&observations).unwrap();
        assert_eq!(batch.len(), 2);
        assert!((batch[1].value - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_masked_softmax_uniform() {
        // positions 0, 4, 6, 8
        let mask = ActionMask::from_bits(0b101010001);
        let probs = masked_softmax(&[0.0; 9], mask).unwrap();

        for a in [0, 4, 6, 8] {
            assert!((probs[a] - 0.25).abs() < 1e-6);
        }
        assert!(probs[1].abs() < 1e-6);
        assert!(probs[2].abs() < 1e-6);
    }

    #[test]
    fn test_masked_softmax_ignores_illegal_logits() {
        let logits = [1.0f32, 100.0, 1.0, 0.0];
        let mask = ActionMask::from_bits(0b0101);
        let probs = masked_softmax(&logits, mask).unwrap();

        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[2] - 0.5).abs() < 1e-6);
        assert!(probs[1].abs() < 1e-6);

        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_masked_softmax_large_logits_are_stable() {
        let logits = [1000.0f32, 999.0, -1000.0];
        let probs = masked_softmax(&logits, ActionMask::full(3)).unwrap();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_masked_softmax_empty_mask() {
        assert!(masked_softmax(&[0.0f32; 9], ActionMask::EMPTY).is_none());
        assert!(masked_softmax(&[f32::NAN; 2], ActionMask::full(2)).is_none());
    }
}
