//! Wires self-play actors and the trainer together
//!
//! Actors run on blocking threads and only share the snapshot registry and
//! the replay buffer with the trainer. Training starts once the buffer holds
//! `warmup_games` games; when it finishes the actors are told to stop.

use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::actor::{Actor, ActorSummary};
use crate::config::Config;
use crate::registry::SnapshotRegistry;
use crate::replay::ReplayBuffer;
use crate::trainer::{Trainer, TrainingSummary};

const WARMUP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub actors: Vec<ActorSummary>,
    pub training: TrainingSummary,
    pub buffer_len: usize,
    pub games_saved: u64,
    pub latest_snapshot: Option<u64>,
}

impl PipelineSummary {
    pub fn games(&self) -> u64 {
        self.actors.iter().map(|a| a.games).sum()
    }

    pub fn failed_games(&self) -> u64 {
        self.actors.iter().map(|a| a.failed_games).sum()
    }
}

pub struct Pipeline {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops actors and trainer between units of work.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_signal)
    }

    fn stopping(&self) -> bool {
        self.shutdown_signal.load(Ordering::Relaxed)
    }

    pub async fn run(self) -> Result<PipelineSummary> {
        let registry = Arc::new(SnapshotRegistry::new(self.config.network_config()?));
        let replay = Arc::new(ReplayBuffer::new(self.config.window_size));

        info!(
            actors = self.config.num_actors,
            episodes_per_actor = self.config.num_episodes,
            window_size = self.config.window_size,
            "Starting self-play"
        );

        let actors: Vec<JoinHandle<ActorSummary>> = (0..self.config.num_actors)
            .map(|id| {
                let actor = Actor::new(
                    id,
                    &self.config,
                    Arc::clone(&registry),
                    Arc::clone(&replay),
                    self.shutdown_handle(),
                );
                tokio::task::spawn_blocking(move || actor.run())
            })
            .collect();

        let warmup = self.wait_for_warmup(&replay, &actors).await;
        let training = match warmup {
            Ok(()) => {
                let trainer = Trainer::new(
                    &self.config,
                    Arc::clone(&registry),
                    Arc::clone(&replay),
                    self.shutdown_handle(),
                )?;
                tokio::task::spawn_blocking(move || trainer.run())
                    .await
                    .context("Trainer task panicked")
                    .and_then(|result| result)
            }
            Err(e) => Err(e),
        };

        // Training is over either way; stop self-play and collect the actors
        self.shutdown_signal.store(true, Ordering::Relaxed);
        let mut summaries = Vec::with_capacity(actors.len());
        for handle in actors {
            summaries.push(handle.await.context("Actor task panicked")?);
        }

        let training = training?;
        let summary = PipelineSummary {
            actors: summaries,
            training,
            buffer_len: replay.len(),
            games_saved: replay.total_saved(),
            latest_snapshot: registry.latest_step(),
        };

        info!(
            games = summary.games(),
            failed_games = summary.failed_games(),
            buffer = summary.buffer_len,
            training_steps = summary.training.steps,
            latest_snapshot = ?summary.latest_snapshot,
            "Pipeline finished"
        );
        Ok(summary)
    }

    /// Wait until the buffer holds `warmup_games` games.
    ///
    /// Fails if every actor exits first or shutdown is requested.
    async fn wait_for_warmup(
        &self,
        replay: &ReplayBuffer,
        actors: &[JoinHandle<ActorSummary>],
    ) -> Result<()> {
        let target = self.config.warmup_games;
        loop {
            // Read before the buffer: an actor saves its games before it finishes
            let all_finished = actors.iter().all(|h| h.is_finished());
            let stored = replay.len();
            if stored >= target {
                info!(games = stored, "Replay buffer warmed up, starting training");
                return Ok(());
            }
            if self.stopping() {
                return Err(anyhow!("Shutdown requested before training started"));
            }
            if all_finished {
                warn!(games = stored, target, "All actors exited during warm-up");
                return Err(anyhow!(
                    "self-play finished with {} of {} warm-up games",
                    stored,
                    target
                ));
            }
            tokio::time::sleep(WARMUP_POLL).await;
        }
    }
}
