//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_bonus() -> f64 {
    defaults::bonus()
}
fn d_penalty() -> f64 {
    defaults::penalty()
}
fn d_max_moves() -> u32 {
    defaults::max_moves()
}
fn d_board_min() -> u32 {
    defaults::board_min()
}
fn d_board_max() -> u32 {
    defaults::board_max()
}
fn d_num_sims() -> u32 {
    defaults::num_simulations()
}
fn d_num_sampling_moves() -> u32 {
    defaults::num_sampling_moves()
}
fn d_pb_c_base() -> f64 {
    defaults::pb_c_base()
}
fn d_pb_c_init() -> f64 {
    defaults::pb_c_init()
}
fn d_dirichlet_alpha() -> f64 {
    defaults::dirichlet_alpha()
}
fn d_root_exploration_fraction() -> f64 {
    defaults::root_exploration_fraction()
}
fn d_num_actors() -> usize {
    defaults::num_actors()
}
fn d_num_episodes() -> u64 {
    defaults::num_episodes()
}
fn d_warmup_games() -> usize {
    defaults::warmup_games()
}
fn d_log_interval() -> u64 {
    defaults::log_interval()
}
fn d_training_steps() -> u64 {
    defaults::training_steps()
}
fn d_ckpt_interval() -> u64 {
    defaults::checkpoint_interval()
}
fn d_window_size() -> usize {
    defaults::window_size()
}
fn d_batch_size() -> usize {
    defaults::batch_size()
}
fn d_lr() -> f64 {
    defaults::learning_rate()
}
fn d_weight_decay() -> f64 {
    defaults::weight_decay()
}
fn d_lr_step_size() -> u64 {
    defaults::lr_step_size()
}
fn d_lr_gamma() -> f64 {
    defaults::lr_gamma()
}
fn d_network() -> String {
    defaults::network().into()
}
fn d_hidden_size() -> usize {
    defaults::hidden_size()
}
fn d_eval_episodes() -> u32 {
    defaults::eval_episodes()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub selfplay: SelfPlayConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
    /// Base RNG seed. Unset means seed from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
            seed: None,
        }
    }
}

/// Puzzle rules: terminal rewards, move cap and the range fresh boards are drawn from.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    #[serde(default = "d_bonus")]
    pub bonus: f64,
    #[serde(default = "d_penalty")]
    pub penalty: f64,
    #[serde(default = "d_max_moves")]
    pub max_moves: u32,
    /// Inclusive lower bound for a fresh cell.
    #[serde(default = "d_board_min")]
    pub board_min: u32,
    /// Exclusive upper bound for a fresh cell.
    #[serde(default = "d_board_max")]
    pub board_max: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bonus: defaults::bonus(),
            penalty: defaults::penalty(),
            max_moves: defaults::max_moves(),
            board_min: defaults::board_min(),
            board_max: defaults::board_max(),
        }
    }
}

/// MCTS (Monte Carlo Tree Search) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_sims")]
    pub num_simulations: u32,
    #[serde(default = "d_num_sampling_moves")]
    pub num_sampling_moves: u32,
    #[serde(default = "d_pb_c_base")]
    pub pb_c_base: f64,
    #[serde(default = "d_pb_c_init")]
    pub pb_c_init: f64,
    #[serde(default = "d_dirichlet_alpha")]
    pub dirichlet_alpha: f64,
    #[serde(default = "d_root_exploration_fraction")]
    pub root_exploration_fraction: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::num_simulations(),
            num_sampling_moves: defaults::num_sampling_moves(),
            pb_c_base: defaults::pb_c_base(),
            pb_c_init: defaults::pb_c_init(),
            dirichlet_alpha: defaults::dirichlet_alpha(),
            root_exploration_fraction: defaults::root_exploration_fraction(),
        }
    }
}

/// Self-play actor configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    #[serde(default = "d_num_actors")]
    pub num_actors: usize,
    /// Games each actor plays before stopping on its own.
    #[serde(default = "d_num_episodes")]
    pub num_episodes: u64,
    /// Games that must be in the replay buffer before training starts.
    #[serde(default = "d_warmup_games")]
    pub warmup_games: usize,
    #[serde(default = "d_log_interval")]
    pub log_interval: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_actors: defaults::num_actors(),
            num_episodes: defaults::num_episodes(),
            warmup_games: defaults::warmup_games(),
            log_interval: defaults::log_interval(),
        }
    }
}

/// Training configuration for the learner
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    #[serde(default = "d_training_steps")]
    pub training_steps: u64,
    #[serde(default = "d_ckpt_interval")]
    pub checkpoint_interval: u64,
    #[serde(default = "d_window_size")]
    pub window_size: usize,
    #[serde(default = "d_batch_size")]
    pub batch_size: usize,
    #[serde(default = "d_lr")]
    pub learning_rate: f64,
    #[serde(default = "d_weight_decay")]
    pub weight_decay: f64,
    #[serde(default = "d_lr_step_size")]
    pub lr_step_size: u64,
    #[serde(default = "d_lr_gamma")]
    pub lr_gamma: f64,
    /// Estimator architecture: "flat" or "conv".
    #[serde(default = "d_network")]
    pub network: String,
    #[serde(default = "d_hidden_size")]
    pub hidden_size: usize,
    /// Greedy evaluation episodes played after each published snapshot.
    #[serde(default = "d_eval_episodes")]
    pub eval_episodes: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            training_steps: defaults::training_steps(),
            checkpoint_interval: defaults::checkpoint_interval(),
            window_size: defaults::window_size(),
            batch_size: defaults::batch_size(),
            learning_rate: defaults::learning_rate(),
            weight_decay: defaults::weight_decay(),
            lr_step_size: defaults::lr_step_size(),
            lr_gamma: defaults::lr_gamma(),
            network: defaults::network().into(),
            hidden_size: defaults::hidden_size(),
            eval_episodes: defaults::eval_episodes(),
        }
    }
}
