//! Immutable network snapshots used by self-play.
//!
//! A snapshot owns a deep copy of the parameters it was taken from, so the
//! learner can keep updating its own variables while actors evaluate
//! positions with the frozen copy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use games_subtraction::{NUM_ACTIONS, NUM_CELLS};
use mcts::{EvalResult, Evaluator, EvaluatorError};
use tracing::debug;

use crate::error::NetworkError;
use crate::model::{NetworkConfig, PolicyValueNet};

/// Frozen policy/value network implementing [`Evaluator`].
pub struct NetworkSnapshot {
    net: PolicyValueNet,
    device: Device,
    /// Training step the parameters were taken at
    step: u64,
    /// Number of observations evaluated (for diagnostics)
    inference_count: AtomicU64,
    /// Total inference time in microseconds (for diagnostics)
    total_inference_time_us: AtomicU64,
}

impl std::fmt::Debug for NetworkSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSnapshot")
            .field("config", &self.net.config())
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl NetworkSnapshot {
    /// Freshly initialised network, used before any training step exists.
    pub fn fresh(config: NetworkConfig) -> Result<Self, NetworkError> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = PolicyValueNet::new(config, vb)?;
        Ok(Self::from_parts(net, device, 0))
    }

    /// Deep-copy the variables of `varmap` into a new network.
    pub fn from_varmap(
        varmap: &VarMap,
        config: NetworkConfig,
        device: &Device,
        step: u64,
    ) -> Result<Self, NetworkError> {
        let tensors = {
            let vars = varmap.data().lock().map_err(|_| NetworkError::Poisoned)?;
            vars.iter()
                .map(|(name, var)| Ok((name.clone(), var.as_tensor().copy()?)))
                .collect::<Result<HashMap<String, Tensor>, NetworkError>>()?
        };

        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
        let net = PolicyValueNet::new(config, vb)?;
        Ok(Self::from_parts(net, device.clone(), step))
    }

    fn from_parts(net: PolicyValueNet, device: Device, step: u64) -> Self {
        Self {
            net,
            device,
            step,
            inference_count: AtomicU64::new(0),
            total_inference_time_us: AtomicU64::new(0),
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn config(&self) -> NetworkConfig {
        self.net.config()
    }

    fn check_observation(obs: &[f32]) -> Result<(), EvaluatorError> {
        if obs.len() != NUM_CELLS {
            return Err(EvaluatorError::InvalidObservation {
                expected: NUM_CELLS,
                actual: obs.len(),
            });
        }
        Ok(())
    }

    fn run(
        &self,
        flat_obs: Vec<f32>,
        batch_size: usize,
    ) -> Result<Vec<EvalResult<NUM_ACTIONS>>, EvaluatorError> {
        let inference_start = Instant::now();

        let input = Tensor::from_vec(flat_obs, (batch_size, NUM_CELLS), &self.device)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to build input: {}", e)))?;
        let (values, logits) = self
            .net
            .forward(&input, false)
            .map_err(|e| EvaluatorError::EvaluationFailed(format!("Forward pass failed: {}", e)))?;

        let values: Vec<f32> = values
            .to_vec1()
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to read value: {}", e)))?;
        let logits: Vec<Vec<f32>> = logits
            .to_vec2()
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to read logits: {}", e)))?;

        let results = values
            .into_iter()
            .zip(logits)
            .map(|(value, row)| {
                let logits: [f32; NUM_ACTIONS] = row.try_into().map_err(|row: Vec<f32>| {
                    EvaluatorError::ModelError(format!(
                        "Expected {} logits, got {}",
                        NUM_ACTIONS,
                        row.len()
                    ))
                })?;
                Ok(EvalResult { logits, value })
            })
            .collect::<Result<Vec<_>, EvaluatorError>>()?;

        let elapsed_us = inference_start.elapsed().as_micros() as u64;
        self.total_inference_time_us
            .fetch_add(elapsed_us, Ordering::Relaxed);
        let before = self
            .inference_count
            .fetch_add(batch_size as u64, Ordering::Relaxed);
        let count = before + batch_size as u64;

        // Log stats every 10,000 evaluations
        if before / 10_000 != count / 10_000 {
            let total_us = self.total_inference_time_us.load(Ordering::Relaxed);
            debug!(
                step = self.step,
                evaluations = count,
                avg_us = total_us / count.max(1),
                "Network inference stats"
            );
        }

        Ok(results)
    }
}

impl Evaluator<NUM_ACTIONS> for NetworkSnapshot {
    fn evaluate(&self, obs: &[f32]) -> Result<EvalResult<NUM_ACTIONS>, EvaluatorError> {
        Self::check_observation(obs)?;
        self.run(obs.to_vec(), 1)?
            .pop()
            .ok_or_else(|| EvaluatorError::ModelError("Empty network output".to_string()))
    }

    fn evaluate_batch(
        &self,
        observations: &[&[f32]],
    ) -> Result<Vec<EvalResult<NUM_ACTIONS>>, EvaluatorError> {
        if observations.is_empty() {
            return Ok(Vec::new());
        }

        let mut flat_obs = Vec::with_capacity(observations.len() * NUM_CELLS);
        for obs in observations {
            Self::check_observation(obs)?;
            flat_obs.extend_from_slice(obs);
        }
        self.run(flat_obs, observations.len())
    }
}
