//! Configuration for the self-play / training binary
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use games_subtraction::Rules;
use mcts::MctsConfig;
use network::{LearnerConfig, NetworkConfig, NetworkKind};
use once_cell::sync::Lazy;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_bonus() -> f32 {
    CENTRAL_CONFIG.game.bonus as f32
}

fn default_penalty() -> f32 {
    CENTRAL_CONFIG.game.penalty as f32
}

fn default_max_moves() -> u32 {
    CENTRAL_CONFIG.game.max_moves
}

fn default_board_min() -> u32 {
    CENTRAL_CONFIG.game.board_min
}

fn default_board_max() -> u32 {
    CENTRAL_CONFIG.game.board_max
}

fn default_num_simulations() -> u32 {
    CENTRAL_CONFIG.mcts.num_simulations
}

fn default_num_sampling_moves() -> u32 {
    CENTRAL_CONFIG.mcts.num_sampling_moves
}

fn default_pb_c_base() -> f32 {
    CENTRAL_CONFIG.mcts.pb_c_base as f32
}

fn default_pb_c_init() -> f32 {
    CENTRAL_CONFIG.mcts.pb_c_init as f32
}

fn default_dirichlet_alpha() -> f32 {
    CENTRAL_CONFIG.mcts.dirichlet_alpha as f32
}

fn default_root_exploration_fraction() -> f32 {
    CENTRAL_CONFIG.mcts.root_exploration_fraction as f32
}

fn default_num_actors() -> usize {
    CENTRAL_CONFIG.selfplay.num_actors
}

fn default_num_episodes() -> u64 {
    CENTRAL_CONFIG.selfplay.num_episodes
}

fn default_warmup_games() -> usize {
    CENTRAL_CONFIG.selfplay.warmup_games
}

fn default_log_interval() -> u64 {
    CENTRAL_CONFIG.selfplay.log_interval
}

fn default_training_steps() -> u64 {
    CENTRAL_CONFIG.training.training_steps
}

fn default_checkpoint_interval() -> u64 {
    CENTRAL_CONFIG.training.checkpoint_interval
}

fn default_window_size() -> usize {
    CENTRAL_CONFIG.training.window_size
}

fn default_batch_size() -> usize {
    CENTRAL_CONFIG.training.batch_size
}

fn default_learning_rate() -> f64 {
    CENTRAL_CONFIG.training.learning_rate
}

fn default_weight_decay() -> f64 {
    CENTRAL_CONFIG.training.weight_decay
}

fn default_lr_step_size() -> u64 {
    CENTRAL_CONFIG.training.lr_step_size
}

fn default_lr_gamma() -> f64 {
    CENTRAL_CONFIG.training.lr_gamma
}

fn default_network() -> String {
    CENTRAL_CONFIG.training.network.clone()
}

fn default_hidden_size() -> usize {
    CENTRAL_CONFIG.training.hidden_size
}

fn default_eval_episodes() -> u32 {
    CENTRAL_CONFIG.training.eval_episodes
}

#[derive(Parser, Debug, Clone)]
#[command(name = "subzero")]
#[command(about = "Self-play and training loop for the subtraction puzzle")]
#[command(
    long_about = "Runs MCTS self-play actors that fill a replay buffer while a trainer
updates the policy/value network and publishes snapshots back to the actors.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Base RNG seed; actors use seed + index. Unset seeds from OS entropy
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reward added for clearing a line
    #[arg(long, default_value_t = default_bonus())]
    pub bonus: f32,

    /// Penalty for a board where every column holds a zero
    #[arg(long, default_value_t = default_penalty())]
    pub penalty: f32,

    /// Move cap per self-play game
    #[arg(long, default_value_t = default_max_moves())]
    pub max_moves: u32,

    /// Smallest cell value of a fresh board
    #[arg(long, default_value_t = default_board_min())]
    pub board_min: u32,

    /// Exclusive upper bound of a fresh cell value
    #[arg(long, default_value_t = default_board_max())]
    pub board_max: u32,

    /// Number of MCTS simulations per move
    #[arg(long, default_value_t = default_num_simulations())]
    pub num_simulations: u32,

    /// Opening moves sampled from visit counts instead of taking the most visited
    #[arg(long, default_value_t = default_num_sampling_moves())]
    pub num_sampling_moves: u32,

    #[arg(long, default_value_t = default_pb_c_base())]
    pub pb_c_base: f32,

    #[arg(long, default_value_t = default_pb_c_init())]
    pub pb_c_init: f32,

    /// Dirichlet concentration of root noise
    #[arg(long, default_value_t = default_dirichlet_alpha())]
    pub dirichlet_alpha: f32,

    /// Share of root priors replaced by noise (0 disables noise)
    #[arg(long, default_value_t = default_root_exploration_fraction())]
    pub root_exploration_fraction: f32,

    /// Number of parallel self-play actors
    #[arg(long, default_value_t = default_num_actors())]
    pub num_actors: usize,

    /// Games each actor plays before stopping
    #[arg(long, default_value_t = default_num_episodes())]
    pub num_episodes: u64,

    /// Games that must be in the replay buffer before training starts
    #[arg(long, default_value_t = default_warmup_games())]
    pub warmup_games: usize,

    /// Log progress every N games per actor (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u64,

    /// Number of gradient updates
    #[arg(long, default_value_t = default_training_steps())]
    pub training_steps: u64,

    /// Steps between published snapshots
    #[arg(long, default_value_t = default_checkpoint_interval())]
    pub checkpoint_interval: u64,

    /// Games kept in the replay buffer
    #[arg(long, default_value_t = default_window_size())]
    pub window_size: usize,

    /// Positions per training batch
    #[arg(long, default_value_t = default_batch_size())]
    pub batch_size: usize,

    #[arg(long, default_value_t = default_learning_rate())]
    pub learning_rate: f64,

    #[arg(long, default_value_t = default_weight_decay())]
    pub weight_decay: f64,

    /// Steps between learning-rate decays (0 disables decay)
    #[arg(long, default_value_t = default_lr_step_size())]
    pub lr_step_size: u64,

    /// Learning-rate decay factor
    #[arg(long, default_value_t = default_lr_gamma())]
    pub lr_gamma: f64,

    /// Network architecture (flat, conv)
    #[arg(long, default_value_t = default_network())]
    pub network: String,

    /// Hidden layer width
    #[arg(long, default_value_t = default_hidden_size())]
    pub hidden_size: usize,

    /// Greedy evaluation episodes after each published snapshot (0 disables)
    #[arg(long, default_value_t = default_eval_episodes())]
    pub eval_episodes: u32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        self.rules().validate()?;
        self.mcts_config().validate().map_err(|e| anyhow!(e))?;
        self.network_config()?.validate()?;
        self.learner_config().validate()?;

        if self.max_moves == 0 {
            return Err(anyhow!("max_moves must be greater than 0"));
        }

        if self.num_actors == 0 {
            return Err(anyhow!("num_actors must be greater than 0"));
        }

        if self.warmup_games == 0 {
            return Err(anyhow!(
                "warmup_games must be at least 1, training cannot sample an empty buffer"
            ));
        }

        if self.window_size == 0 {
            return Err(anyhow!("window_size must be greater than 0"));
        }

        if self.warmup_games > self.window_size {
            return Err(anyhow!(
                "warmup_games ({}) cannot exceed window_size ({})",
                self.warmup_games,
                self.window_size
            ));
        }

        if (self.num_actors as u64).saturating_mul(self.num_episodes) < self.warmup_games as u64 {
            return Err(anyhow!(
                "{} actors x {} episodes can never reach warmup_games ({})",
                self.num_actors,
                self.num_episodes,
                self.warmup_games
            ));
        }

        if self.batch_size == 0 {
            return Err(anyhow!("batch_size must be greater than 0"));
        }

        Ok(())
    }

    /// CLI seed, falling back to `common.seed` from the central config.
    pub fn seed(&self) -> Option<u64> {
        self.seed.or(CENTRAL_CONFIG.common.seed)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            bonus: self.bonus,
            penalty: self.penalty,
            max_moves: self.max_moves,
            board_min: self.board_min,
            board_max: self.board_max,
        }
    }

    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig {
            num_simulations: self.num_simulations,
            num_sampling_moves: self.num_sampling_moves,
            pb_c_base: self.pb_c_base,
            pb_c_init: self.pb_c_init,
            dirichlet_alpha: self.dirichlet_alpha,
            root_exploration_fraction: self.root_exploration_fraction,
        }
    }

    /// Same search budget as self-play, without root noise or sampled openings.
    pub fn evaluation_mcts_config(&self) -> MctsConfig {
        MctsConfig::for_evaluation()
            .with_simulations(self.num_simulations)
            .with_exploration(self.pb_c_base, self.pb_c_init)
    }

    pub fn network_config(&self) -> Result<NetworkConfig> {
        let kind: NetworkKind = self.network.parse()?;
        Ok(NetworkConfig::new(kind, self.hidden_size))
    }

    pub fn learner_config(&self) -> LearnerConfig {
        LearnerConfig {
            learning_rate: self.learning_rate,
            weight_decay: self.weight_decay,
            lr_step_size: self.lr_step_size,
            lr_gamma: self.lr_gamma,
        }
    }
}

/// Small, fast configuration shared by the tests of every module.
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        log_level: "info".into(),
        seed: Some(7),
        bonus: 10.0,
        penalty: 10.0,
        max_moves: 60,
        board_min: 1,
        board_max: 8,
        num_simulations: 4,
        num_sampling_moves: 2,
        pb_c_base: 19652.0,
        pb_c_init: 1.25,
        dirichlet_alpha: 0.3,
        root_exploration_fraction: 0.25,
        num_actors: 2,
        num_episodes: 3,
        warmup_games: 2,
        log_interval: 0,
        training_steps: 4,
        checkpoint_interval: 2,
        window_size: 16,
        batch_size: 8,
        learning_rate: 1e-3,
        weight_decay: 1e-4,
        lr_step_size: 100,
        lr_gamma: 0.1,
        network: "flat".into(),
        hidden_size: 8,
        eval_episodes: 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_valid_configuration() {
        let cfg = test_config();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = test_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_unknown_network() {
        let mut cfg = test_config();
        cfg.network = "transformer".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("transformer"));
    }

    #[test]
    fn validate_rejects_zero_warmup() {
        let mut cfg = test_config();
        cfg.warmup_games = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("warmup_games"));
    }

    #[test]
    fn validate_rejects_unreachable_warmup() {
        let mut cfg = test_config();
        cfg.num_actors = 1;
        cfg.num_episodes = 1;
        cfg.warmup_games = 2;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("never reach"));
    }

    #[test]
    fn validate_rejects_empty_board_range() {
        let mut cfg = test_config();
        cfg.board_min = 5;
        cfg.board_max = 5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn validate_rejects_bad_mcts_settings() {
        let mut cfg = test_config();
        cfg.num_simulations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_and_window() {
        let mut cfg = test_config();
        cfg.batch_size = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("batch_size"));

        let mut cfg = test_config();
        cfg.window_size = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("window_size"));
    }

    #[test]
    fn conversions_carry_values() {
        let cfg = test_config();
        assert_eq!(cfg.rules().board_max, 8);
        assert_eq!(cfg.mcts_config().num_simulations, 4);
        assert_eq!(
            cfg.network_config().unwrap(),
            NetworkConfig::new(NetworkKind::Flat, 8)
        );
        assert_eq!(cfg.learner_config().lr_step_size, 100);

        let eval = cfg.evaluation_mcts_config();
        assert_eq!(eval.num_simulations, 4);
        assert_eq!(eval.num_sampling_moves, 0);
        assert!(!eval.uses_root_noise());
    }

    #[test]
    fn central_defaults_reach_cli() {
        let cfg = Config::parse_from(["subzero"]);
        assert_eq!(cfg.num_simulations, CENTRAL_CONFIG.mcts.num_simulations);
        assert_eq!(cfg.network, CENTRAL_CONFIG.training.network);
        assert_eq!(cfg.seed(), CENTRAL_CONFIG.common.seed);
        assert_eq!(test_config().seed(), Some(7));
    }
}
