//! Self-play actor: plays MCTS-guided games against the latest snapshot

use anyhow::{Context, Result};
use games_subtraction::{Rules, SubtractionGame, Termination};
use mcts::{run_mcts, MctsConfig, SearchStats};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::registry::SnapshotRegistry;
use crate::replay::ReplayBuffer;

/// Aggregated MCTS stats for an episode.
#[derive(Debug, Default)]
pub struct EpisodeStats {
    /// Number of MCTS searches performed
    pub search_count: u32,
    /// Time spent in tree selection (microseconds)
    pub selection_time_us: u64,
    /// Time spent in network inference (microseconds)
    pub inference_time_us: u64,
    /// Time spent in backpropagation (microseconds)
    pub backprop_time_us: u64,
    /// Total network evaluations
    pub total_evals: u32,
    /// Total terminal leaves reached
    pub terminal_hits: u32,
    pub max_depth: u32,
}

impl EpisodeStats {
    /// Add stats from a single MCTS search.
    fn add(&mut self, stats: &SearchStats) {
        self.search_count += 1;
        self.selection_time_us += stats.selection_us;
        self.inference_time_us += stats.inference_us;
        self.backprop_time_us += stats.backprop_us;
        self.total_evals += stats.evaluations;
        self.terminal_hits += stats.terminal_leaves;
        self.max_depth = self.max_depth.max(stats.max_depth);
    }

    fn log_summary(&self, actor_id: usize, episode_num: u64) {
        let total_us = self.selection_time_us + self.inference_time_us + self.backprop_time_us;
        if self.search_count == 0 || total_us == 0 {
            return;
        }

        let inference_pct = (self.inference_time_us as f64 / total_us as f64) * 100.0;
        let selection_pct = (self.selection_time_us as f64 / total_us as f64) * 100.0;
        let backprop_pct = (self.backprop_time_us as f64 / total_us as f64) * 100.0;

        info!(
            actor = actor_id,
            episode = episode_num,
            searches = self.search_count,
            total_ms = format!("{:.1}", total_us as f64 / 1000.0),
            inference_pct = format!("{:.1}%", inference_pct),
            selection_pct = format!("{:.1}%", selection_pct),
            backprop_pct = format!("{:.1}%", backprop_pct),
            evals = self.total_evals,
            terminal_hits = self.terminal_hits,
            max_depth = self.max_depth,
            "MCTS episode stats"
        );
    }
}

/// What one actor did before stopping.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActorSummary {
    pub games: u64,
    pub failed_games: u64,
    pub moves: u64,
    pub wins: u64,
    pub losses: u64,
}

pub struct Actor {
    id: usize,
    rules: Rules,
    mcts: MctsConfig,
    num_episodes: u64,
    log_interval: u64,
    registry: Arc<SnapshotRegistry>,
    replay: Arc<ReplayBuffer>,
    shutdown_signal: Arc<AtomicBool>,
    rng: ChaCha20Rng,
}

impl Actor {
    pub fn new(
        id: usize,
        config: &Config,
        registry: Arc<SnapshotRegistry>,
        replay: Arc<ReplayBuffer>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        let rng = match config.seed() {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => ChaCha20Rng::from_entropy(),
        };

        Self {
            id,
            rules: config.rules(),
            mcts: config.mcts_config(),
            num_episodes: config.num_episodes,
            log_interval: config.log_interval,
            registry,
            replay,
            shutdown_signal,
            rng,
        }
    }

    /// Play up to `num_episodes` games, stopping early on shutdown.
    ///
    /// Blocking; run it on a blocking thread.
    pub fn run(mut self) -> ActorSummary {
        info!(
            actor = self.id,
            episodes = self.num_episodes,
            simulations = self.mcts.num_simulations,
            "Actor starting self-play"
        );

        let mut summary = ActorSummary::default();

        for episode in 1..=self.num_episodes {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!(actor = self.id, "Shutdown signal received, stopping actor");
                break;
            }

            let episode_start = Instant::now();
            let outcome = self.play_game().and_then(|(game, stats)| {
                let moves = game.len() as u64;
                let termination = game.termination();
                self.replay
                    .save(game)
                    .context("Failed to save game to replay buffer")?;
                Ok((moves, termination, stats))
            });

            match outcome {
                Ok((moves, termination, stats)) => {
                    summary.games += 1;
                    summary.moves += moves;
                    match termination {
                        Some(Termination::Win) => summary.wins += 1,
                        Some(Termination::Loss) => summary.losses += 1,
                        None => {}
                    }

                    debug!(
                        actor = self.id,
                        episode,
                        moves,
                        ?termination,
                        duration = episode_start.elapsed().as_secs_f64(),
                        "Episode completed"
                    );

                    if self.log_interval > 0 && episode % self.log_interval == 0 {
                        info!(
                            actor = self.id,
                            "Completed {} episodes ({} moves, buffer {})",
                            episode,
                            summary.moves,
                            self.replay.len()
                        );
                        stats.log_summary(self.id, episode);
                    }
                }
                Err(e) => {
                    summary.failed_games += 1;
                    error!(actor = self.id, "Episode {} failed: {:#}", episode, e);
                    // A failed game is discarded; continue with the next one
                }
            }
        }

        info!(
            actor = self.id,
            games = summary.games,
            failed = summary.failed_games,
            "Actor stopped"
        );
        summary
    }

    /// Play one game to termination or the move cap.
    pub fn play_game(&mut self) -> Result<(SubtractionGame, EpisodeStats)> {
        let network = self
            .registry
            .latest()
            .context("Failed to fetch latest snapshot")?;
        let mut game = SubtractionGame::new(self.rules, &mut self.rng)?;
        let mut stats = EpisodeStats::default();
        let max_moves = self.rules.max_moves as usize;

        while !game.terminal() && game.len() < max_moves {
            let result = run_mcts(
                &game.position(),
                network.as_ref(),
                self.mcts.clone(),
                &mut self.rng,
            )
            .with_context(|| format!("Search failed at move {}", game.len()))?;

            game.apply(result.action)?;
            game.store_search_statistics(result.policy);
            stats.add(&result.stats);
        }

        Ok((game, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn actor(config: &Config) -> (Actor, Arc<ReplayBuffer>, Arc<AtomicBool>) {
        let registry = Arc::new(SnapshotRegistry::new(config.network_config().unwrap()));
        let replay = Arc::new(ReplayBuffer::new(config.window_size));
        let shutdown = Arc::new(AtomicBool::new(false));
        let actor = Actor::new(
            0,
            config,
            registry,
            Arc::clone(&replay),
            Arc::clone(&shutdown),
        );
        (actor, replay, shutdown)
    }

    #[test]
    fn test_play_game_records_statistics() {
        let config = test_config();
        let (mut actor, _, _) = actor(&config);

        let (game, stats) = actor.play_game().unwrap();

        assert!(game.terminal() || game.len() == config.max_moves as usize);
        assert!(!game.is_empty());
        assert_eq!(game.child_visits().len(), game.len());
        assert_eq!(stats.search_count as usize, game.len());
        for policy in game.child_visits() {
            let sum: f32 = policy.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_run_fills_replay_buffer() {
        let config = test_config();
        let (actor, replay, _) = actor(&config);

        let summary = actor.run();

        assert_eq!(summary.games, config.num_episodes);
        assert_eq!(summary.failed_games, 0);
        assert_eq!(replay.len() as u64, config.num_episodes);
    }

    #[test]
    fn test_run_respects_shutdown() {
        let config = test_config();
        let (actor, replay, shutdown) = actor(&config);
        shutdown.store(true, Ordering::Relaxed);

        let summary = actor.run();

        assert_eq!(summary.games, 0);
        assert!(replay.is_empty());
    }

    #[test]
    fn test_seeded_actors_are_deterministic() {
        let config = test_config();
        let (mut a, _, _) = actor(&config);
        let (mut b, _, _) = actor(&config);

        let (game_a, _) = a.play_game().unwrap();
        let (game_b, _) = b.play_game().unwrap();
        assert_eq!(game_a.initial_board(), game_b.initial_board());
    }
}
