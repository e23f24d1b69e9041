//! Greedy evaluation episodes played through the step environment
//!
//! After a snapshot is published the trainer plays a few noise-free episodes
//! with it and reports the mean episode reward, how that reward compares to
//! the cheapest way of zeroing the board, and how often the bonus fired.

use anyhow::{Context, Result};
use games_subtraction::{
    Axis, Board, Position, Rules, SubtractionEnv, Termination, BOARD_SIZE, NUM_ACTIONS,
};
use mcts::{run_mcts, MctsConfig, SearchResult};
use network::NetworkSnapshot;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use crate::config::Config;

/// Cost of the cheaper of two strategies: zero every row, or zero every
/// column, each line at its minimum.
pub fn expected_min_cost(board: &Board) -> f32 {
    let line_minimums = |axis| -> u32 {
        (0..BOARD_SIZE)
            .map(|i| board.line(axis, i).into_iter().min().unwrap_or(0))
            .sum()
    };
    line_minimums(Axis::Row).min(line_minimums(Axis::Column)) as f32
}

/// One finished evaluation episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeOutcome {
    pub reward: f32,
    pub expected_min_cost: f32,
    pub termination: Option<Termination>,
    pub moves: u32,
}

impl EpisodeOutcome {
    /// Episode reward relative to the cheapest line clearing, 0 for a zero cost.
    pub fn cost_ratio(&self) -> f32 {
        if self.expected_min_cost > 0.0 {
            self.reward / self.expected_min_cost
        } else {
            0.0
        }
    }
}

/// Aggregate over the episodes played against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    /// Snapshot step that was evaluated
    pub step: u64,
    pub episodes: u32,
    pub mean_reward: f32,
    pub mean_cost_ratio: f32,
    /// Share of episodes that ended on a cleared line
    pub win_rate: f32,
    pub mean_moves: f32,
}

impl EvaluationReport {
    fn from_outcomes(step: u64, outcomes: &[EpisodeOutcome]) -> Self {
        let n = outcomes.len().max(1) as f32;
        let mean = |f: fn(&EpisodeOutcome) -> f32| outcomes.iter().map(f).sum::<f32>() / n;
        Self {
            step,
            episodes: outcomes.len() as u32,
            mean_reward: mean(|o| o.reward),
            mean_cost_ratio: mean(EpisodeOutcome::cost_ratio),
            win_rate: mean(|o| (o.termination == Some(Termination::Win)) as u32 as f32),
            mean_moves: mean(|o| o.moves as f32),
        }
    }
}

pub struct Evaluation {
    rules: Rules,
    mcts: MctsConfig,
    episodes: u32,
    rng: ChaCha20Rng,
}

impl Evaluation {
    pub fn new(config: &Config) -> Self {
        // Actors take seed..seed+num_actors, the trainer seed+num_actors
        let rng = match config.seed() {
            Some(seed) => {
                ChaCha20Rng::seed_from_u64(seed.wrapping_add(config.num_actors as u64 + 1))
            }
            None => ChaCha20Rng::from_entropy(),
        };

        Self {
            rules: config.rules(),
            mcts: config.evaluation_mcts_config(),
            episodes: config.eval_episodes,
            rng,
        }
    }

    /// Episodes per evaluation; 0 disables evaluation.
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Play one episode, choosing every move by greedy search.
    pub fn play_episode(&mut self, network: &NetworkSnapshot) -> Result<EpisodeOutcome> {
        let mut env = SubtractionEnv::new(self.rules, &mut self.rng)?;
        let cost = expected_min_cost(env.board());
        let mut reward = 0.0;
        let mut termination = None;
        let mut moves = 0;

        while !env.is_done() {
            let position = Position::new(*env.board(), moves as usize);
            let result: SearchResult<NUM_ACTIONS> =
                run_mcts(&position, network, self.mcts.clone(), &mut self.rng)
                    .with_context(|| format!("Evaluation search failed at move {}", moves))?;

            let step = env.step(result.action)?;
            reward += step.reward;
            termination = step.info.termination;
            moves = step.info.moves;
        }

        Ok(EpisodeOutcome {
            reward,
            expected_min_cost: cost,
            termination,
            moves,
        })
    }

    /// Play `episodes` episodes against `network` and log the aggregate.
    pub fn run(&mut self, step: u64, network: &NetworkSnapshot) -> Result<EvaluationReport> {
        let mut outcomes = Vec::with_capacity(self.episodes as usize);
        for episode in 0..self.episodes {
            let outcome = self.play_episode(network)?;
            debug!(
                step,
                episode,
                reward = outcome.reward,
                ratio = outcome.cost_ratio(),
                bonus = outcome.termination == Some(Termination::Win),
                "Evaluation episode"
            );
            outcomes.push(outcome);
        }

        let report = EvaluationReport::from_outcomes(step, &outcomes);
        info!(
            step,
            episodes = report.episodes,
            mean_reward = format!("{:.2}", report.mean_reward),
            mean_ratio = format!("{:.3}", report.mean_cost_ratio),
            win_rate = format!("{:.1}%", report.win_rate * 100.0),
            mean_moves = format!("{:.1}", report.mean_moves),
            "Evaluation"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_expected_min_cost_takes_cheaper_axis() {
        // Rows: 1 + 4 + 7 = 12, columns: 1 + 2 + 3 = 6
        let board = Board::from_rows([[1, 2, 3], [4, 5, 6], [7, 8, 9]]);
        assert_eq!(expected_min_cost(&board), 6.0);

        let transposed = Board::from_rows([[1, 4, 7], [2, 5, 8], [3, 6, 9]]);
        assert_eq!(expected_min_cost(&transposed), 6.0);
    }

    #[test]
    fn test_report_averages_outcomes() {
        let outcomes = [
            EpisodeOutcome {
                reward: 6.0,
                expected_min_cost: 2.0,
                termination: Some(Termination::Win),
                moves: 2,
            },
            EpisodeOutcome {
                reward: -14.0,
                expected_min_cost: 4.0,
                termination: Some(Termination::Loss),
                moves: 4,
            },
        ];

        let report = EvaluationReport::from_outcomes(3, &outcomes);

        assert_eq!(report.step, 3);
        assert_eq!(report.episodes, 2);
        assert!((report.mean_reward + 4.0).abs() < 1e-6);
        assert!((report.mean_cost_ratio + 0.25).abs() < 1e-6);
        assert!((report.win_rate - 0.5).abs() < 1e-6);
        assert!((report.mean_moves - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_episode_reward_matches_environment() {
        let mut config = test_config();
        config.board_min = 1;
        config.board_max = 2;
        let mut evaluation = Evaluation::new(&config);
        let network = NetworkSnapshot::fresh(config.network_config().unwrap()).unwrap();

        let outcome = evaluation.play_episode(&network).unwrap();

        // Every move on a board of ones clears a line at once
        assert_eq!(outcome.moves, 1);
        assert_eq!(outcome.termination, Some(Termination::Win));
        assert!((outcome.reward - 9.0).abs() < 1e-6);
        assert_eq!(outcome.expected_min_cost, 3.0);
        assert!((outcome.cost_ratio() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_reports_finite_metrics() {
        let config = test_config();
        let mut evaluation = Evaluation::new(&config);
        let network = NetworkSnapshot::fresh(config.network_config().unwrap()).unwrap();

        let report = evaluation.run(0, &network).unwrap();

        assert_eq!(report.episodes, config.eval_episodes);
        assert!(report.mean_reward.is_finite());
        assert!(report.mean_cost_ratio.is_finite());
        assert!((0.0..=1.0).contains(&report.win_rate));
        assert!(report.mean_moves >= 1.0);
        assert!(report.mean_moves <= config.max_moves as f32);
    }
}
