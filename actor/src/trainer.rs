//! Training driver: samples the replay buffer and publishes snapshots

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use network::{Learner, LossStats, NetworkError, NetworkSnapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::evaluation::{Evaluation, EvaluationReport};
use crate::registry::SnapshotRegistry;
use crate::replay::ReplayBuffer;

/// What the trainer did before stopping.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Updates applied
    pub steps: u64,
    /// Batches dropped because the loss was not finite
    pub skipped_steps: u64,
    pub last_loss: Option<LossStats>,
    /// Step of the final published snapshot
    pub final_snapshot: u64,
    /// One report per evaluated snapshot, in publish order
    pub evaluations: Vec<EvaluationReport>,
}

pub struct Trainer {
    learner: Learner,
    registry: Arc<SnapshotRegistry>,
    replay: Arc<ReplayBuffer>,
    shutdown_signal: Arc<AtomicBool>,
    training_steps: u64,
    checkpoint_interval: u64,
    batch_size: usize,
    evaluation: Evaluation,
    rng: ChaCha20Rng,
}

impl Trainer {
    pub fn new(
        config: &Config,
        registry: Arc<SnapshotRegistry>,
        replay: Arc<ReplayBuffer>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        let learner = Learner::new(config.network_config()?, config.learner_config())
            .context("Failed to build learner")?;

        // Actors take seed..seed+num_actors
        let rng = match config.seed() {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed.wrapping_add(config.num_actors as u64)),
            None => ChaCha20Rng::from_entropy(),
        };

        Ok(Self {
            learner,
            registry,
            replay,
            shutdown_signal,
            training_steps: config.training_steps,
            checkpoint_interval: config.checkpoint_interval,
            batch_size: config.batch_size,
            evaluation: Evaluation::new(config),
            rng,
        })
    }

    fn is_checkpoint(&self, step: u64) -> bool {
        self.checkpoint_interval > 0 && step % self.checkpoint_interval == 0
    }

    fn publish(&self, step: u64) -> Result<Arc<NetworkSnapshot>> {
        let snapshot = self
            .learner
            .snapshot(step)
            .with_context(|| format!("Failed to snapshot network at step {}", step))?;
        Ok(self.registry.save(step, snapshot)?)
    }

    /// Publish a snapshot at `step` and evaluate it.
    ///
    /// A failed evaluation is logged and yields no report; training goes on.
    fn checkpoint(&mut self, step: u64) -> Result<Option<EvaluationReport>> {
        let snapshot = self.publish(step)?;
        if self.evaluation.episodes() == 0 {
            return Ok(None);
        }
        match self.evaluation.run(step, &snapshot) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                error!(step, "Evaluation failed: {:#}", e);
                Ok(None)
            }
        }
    }

    /// Run `training_steps` updates, publishing a snapshot every
    /// `checkpoint_interval` steps and once more at the end.
    ///
    /// Blocking; run it on a blocking thread. The buffer must hold at least
    /// one game with a move.
    pub fn run(mut self) -> Result<TrainingSummary> {
        info!(
            steps = self.training_steps,
            batch_size = self.batch_size,
            checkpoint_interval = self.checkpoint_interval,
            network = %self.learner.network_config().kind,
            "Trainer starting"
        );

        // Progress bar only when stderr is a TTY
        let progress = if self.training_steps > 0
            && std::io::IsTerminal::is_terminal(&std::io::stderr())
        {
            let pb = ProgressBar::new(self.training_steps);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} steps ({eta}) {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let mut last_loss = None;
        let mut evaluations = Vec::new();
        let mut skipped_steps = 0u64;
        let mut step = 0u64;

        while step < self.training_steps {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!(step, "Shutdown signal received, stopping trainer");
                break;
            }

            if self.is_checkpoint(step) {
                let report = match progress {
                    Some(ref pb) => pb.suspend(|| self.checkpoint(step))?,
                    None => self.checkpoint(step)?,
                };
                evaluations.extend(report);
                let message = format!("Published snapshot {} (buffer {})", step, self.replay.len());
                match progress {
                    Some(ref pb) => pb.suspend(|| info!("{}", message)),
                    None => info!("{}", message),
                }
            }

            let batch = self
                .replay
                .sample_batch(self.batch_size, &mut self.rng)
                .context("Failed to sample training batch")?;

            match self.learner.train_step(&batch) {
                Ok(loss) => {
                    debug!(
                        step,
                        value_loss = loss.value_loss,
                        policy_loss = loss.policy_loss,
                        lr = loss.learning_rate,
                        "Training step"
                    );
                    if let Some(ref pb) = progress {
                        pb.set_message(format!("loss {:.4}", loss.total));
                    }
                    last_loss = Some(loss);
                }
                Err(NetworkError::NonFiniteLoss(value)) => {
                    skipped_steps += 1;
                    warn!(step, loss = value, "Skipping batch with non-finite loss");
                }
                Err(e) => return Err(e).context("Training step failed"),
            }

            step += 1;
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        }

        // Completed runs publish under `training_steps`, interrupted ones under the last step
        let report = match progress {
            Some(ref pb) => pb.suspend(|| self.checkpoint(step))?,
            None => self.checkpoint(step)?,
        };
        evaluations.extend(report);

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        info!(
            steps = step,
            skipped = skipped_steps,
            final_loss = last_loss.map(|l| l.total),
            snapshots = self.registry.len(),
            "Trainer finished"
        );

        Ok(TrainingSummary {
            steps: step,
            skipped_steps,
            last_loss,
            final_snapshot: step,
            evaluations,
        })
    }
}
