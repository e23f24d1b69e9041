//! Gradient updates for the policy/value network.
//!
//! Loss per batch is `smooth_l1(value, target_value)` plus the soft
//! cross-entropy between the policy logits and the visit distribution.
//! AdamW with decoupled weight decay; the learning rate is multiplied by
//! `lr_gamma` every `lr_step_size` steps.

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::log_softmax, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use games_subtraction::{PolicyTarget, NUM_ACTIONS, NUM_CELLS};
use tracing::trace;

use crate::error::NetworkError;
use crate::model::{NetworkConfig, PolicyValueNet};
use crate::snapshot::NetworkSnapshot;

/// One `(observation, (value, policy))` training pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub observation: [f32; NUM_CELLS],
    pub value: f32,
    pub policy: PolicyTarget,
}

/// Optimiser settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Steps between learning-rate decays. 0 disables decay.
    pub lr_step_size: u64,
    pub lr_gamma: f64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 2e-3,
            weight_decay: 1e-4,
            lr_step_size: 200_000,
            lr_gamma: 0.1,
        }
    }
}

impl LearnerConfig {
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(NetworkError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.weight_decay.is_nan() || self.weight_decay < 0.0 {
            return Err(NetworkError::InvalidConfig(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        if !(self.lr_gamma.is_finite() && self.lr_gamma > 0.0) {
            return Err(NetworkError::InvalidConfig(format!(
                "lr_gamma must be positive, got {}",
                self.lr_gamma
            )));
        }
        Ok(())
    }

    /// Learning rate after `step` completed updates.
    pub fn learning_rate_at(&self, step: u64) -> f64 {
        if self.lr_step_size == 0 {
            return self.learning_rate;
        }
        let decays = (step / self.lr_step_size).min(i32::MAX as u64) as i32;
        self.learning_rate * self.lr_gamma.powi(decays)
    }
}

/// Losses of a single update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossStats {
    pub value_loss: f32,
    pub policy_loss: f32,
    pub total: f32,
    pub learning_rate: f64,
}

/// Owns the trainable parameters and their optimiser.
pub struct Learner {
    varmap: VarMap,
    net: PolicyValueNet,
    optimizer: AdamW,
    config: LearnerConfig,
    device: Device,
    steps: u64,
}

impl std::fmt::Debug for Learner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Learner")
            .field("network", &self.net.config())
            .field("config", &self.config)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Learner {
    pub fn new(network: NetworkConfig, config: LearnerConfig) -> Result<Self, NetworkError> {
        config.validate()?;
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = PolicyValueNet::new(network, vb)?;

        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: config.weight_decay,
                ..Default::default()
            },
        )?;

        Ok(Self {
            varmap,
            net,
            optimizer,
            config,
            device,
            steps: 0,
        })
    }

    /// Completed updates.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    pub fn network_config(&self) -> NetworkConfig {
        self.net.config()
    }

    /// Frozen copy of the current parameters, tagged with `step`.
    pub fn snapshot(&self, step: u64) -> Result<NetworkSnapshot, NetworkError> {
        NetworkSnapshot::from_varmap(&self.varmap, self.net.config(), &self.device, step)
    }

    /// Loss of `batch` without updating parameters.
    pub fn loss(&self, batch: &[TrainingSample]) -> Result<LossStats, NetworkError> {
        let (value_loss, policy_loss) = self.losses(batch, false)?;
        let value_loss = value_loss.to_scalar::<f32>()?;
        let policy_loss = policy_loss.to_scalar::<f32>()?;
        Ok(LossStats {
            value_loss,
            policy_loss,
            total: value_loss + policy_loss,
            learning_rate: self.learning_rate(),
        })
    }

    /// One optimiser step on `batch`.
    ///
    /// A non-finite loss skips the update and returns `NonFiniteLoss`.
    pub fn train_step(&mut self, batch: &[TrainingSample]) -> Result<LossStats, NetworkError> {
        let (value_loss, policy_loss) = self.losses(batch, true)?;
        let loss = (&value_loss + &policy_loss)?;

        let total = loss.to_scalar::<f32>()?;
        if !total.is_finite() {
            return Err(NetworkError::NonFiniteLoss(total));
        }

        let learning_rate = self.optimizer.learning_rate();
        self.optimizer.backward_step(&loss)?;
        self.steps += 1;
        self.optimizer
            .set_learning_rate(self.config.learning_rate_at(self.steps));

        let stats = LossStats {
            value_loss: value_loss.to_scalar::<f32>()?,
            policy_loss: policy_loss.to_scalar::<f32>()?,
            total,
            learning_rate,
        };
        trace!(step = self.steps, ?stats, "Training step");
        Ok(stats)
    }

    fn losses(
        &self,
        batch: &[TrainingSample],
        train: bool,
    ) -> Result<(Tensor, Tensor), NetworkError> {
        if batch.is_empty() {
            return Err(NetworkError::EmptyBatch);
        }
        let n = batch.len();

        let observations: Vec<f32> = batch.iter().flat_map(|s| s.observation).collect();
        let values: Vec<f32> = batch.iter().map(|s| s.value).collect();
        let policies: Vec<f32> = batch.iter().flat_map(|s| s.policy).collect();

        let xs = Tensor::from_vec(observations, (n, NUM_CELLS), &self.device)?;
        let target_values = Tensor::from_vec(values, n, &self.device)?;
        let target_policies = Tensor::from_vec(policies, (n, NUM_ACTIONS), &self.device)?;

        let (values, logits) = self.net.forward(&xs, train)?;
        let value_loss = smooth_l1_loss(&values, &target_values)?;
        let policy_loss = soft_cross_entropy(&logits, &target_policies)?;
        Ok((value_loss, policy_loss))
    }
}

/// Huber loss with `beta = 1`, averaged over the batch.
pub fn smooth_l1_loss(pred: &Tensor, target: &Tensor) -> Result<Tensor, NetworkError> {
    let diff = (pred - target)?;
    let abs = diff.abs()?;
    let quadratic = diff.sqr()?.affine(0.5, 0.0)?;
    let linear = abs.affine(1.0, -0.5)?;
    let loss = abs.lt(1f32)?.where_cond(&quadratic, &linear)?;
    Ok(loss.mean_all()?)
}

/// Cross-entropy against a probability target, averaged over the batch.
pub fn soft_cross_entropy(logits: &Tensor, target: &Tensor) -> Result<Tensor, NetworkError> {
    let log_probs = log_softmax(logits, D::Minus1)?;
    let per_sample = (target * log_probs)?.sum(D::Minus1)?;
    Ok(per_sample.mean_all()?.neg()?)
}
