//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so the binary and the
//! config structs never disagree about a value.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    game: GameDefaults,
    mcts: MctsDefaults,
    selfplay: SelfPlayDefaults,
    training: TrainingDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct GameDefaults {
    bonus: f64,
    penalty: f64,
    max_moves: u32,
    board_min: u32,
    board_max: u32,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_simulations: u32,
    num_sampling_moves: u32,
    pb_c_base: f64,
    pb_c_init: f64,
    dirichlet_alpha: f64,
    root_exploration_fraction: f64,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    num_actors: usize,
    num_episodes: u64,
    warmup_games: usize,
    log_interval: u64,
}

#[derive(Debug, Deserialize)]
struct TrainingDefaults {
    training_steps: u64,
    checkpoint_interval: u64,
    window_size: usize,
    batch_size: usize,
    learning_rate: f64,
    weight_decay: f64,
    lr_step_size: u64,
    lr_gamma: f64,
    network: String,
    hidden_size: usize,
    eval_episodes: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Game
pub fn bonus() -> f64 {
    DEFAULTS.game.bonus
}
pub fn penalty() -> f64 {
    DEFAULTS.game.penalty
}
pub fn max_moves() -> u32 {
    DEFAULTS.game.max_moves
}
pub fn board_min() -> u32 {
    DEFAULTS.game.board_min
}
pub fn board_max() -> u32 {
    DEFAULTS.game.board_max
}

// MCTS
pub fn num_simulations() -> u32 {
    DEFAULTS.mcts.num_simulations
}
pub fn num_sampling_moves() -> u32 {
    DEFAULTS.mcts.num_sampling_moves
}
pub fn pb_c_base() -> f64 {
    DEFAULTS.mcts.pb_c_base
}
pub fn pb_c_init() -> f64 {
    DEFAULTS.mcts.pb_c_init
}
pub fn dirichlet_alpha() -> f64 {
    DEFAULTS.mcts.dirichlet_alpha
}
pub fn root_exploration_fraction() -> f64 {
    DEFAULTS.mcts.root_exploration_fraction
}

// Self-play
pub fn num_actors() -> usize {
    DEFAULTS.selfplay.num_actors
}
pub fn num_episodes() -> u64 {
    DEFAULTS.selfplay.num_episodes
}
pub fn warmup_games() -> usize {
    DEFAULTS.selfplay.warmup_games
}
pub fn log_interval() -> u64 {
    DEFAULTS.selfplay.log_interval
}

// Training
pub fn training_steps() -> u64 {
    DEFAULTS.training.training_steps
}
pub fn checkpoint_interval() -> u64 {
    DEFAULTS.training.checkpoint_interval
}
pub fn window_size() -> usize {
    DEFAULTS.training.window_size
}
pub fn batch_size() -> usize {
    DEFAULTS.training.batch_size
}
pub fn learning_rate() -> f64 {
    DEFAULTS.training.learning_rate
}
pub fn weight_decay() -> f64 {
    DEFAULTS.training.weight_decay
}
pub fn lr_step_size() -> u64 {
    DEFAULTS.training.lr_step_size
}
pub fn lr_gamma() -> f64 {
    DEFAULTS.training.lr_gamma
}
pub fn network() -> &'static str {
    &DEFAULTS.training.network
}
pub fn hidden_size() -> usize {
    DEFAULTS.training.hidden_size
}
pub fn eval_episodes() -> u32 {
    DEFAULTS.training.eval_episodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        // Just accessing these will verify the TOML parses correctly
        assert_eq!(log_level(), "info");
        assert_eq!(max_moves(), 300);
        assert_eq!(board_min(), 1);
        assert_eq!(board_max(), 100);
    }

    #[test]
    fn test_mcts_defaults() {
        assert_eq!(num_simulations(), 8);
        assert_eq!(num_sampling_moves(), 5);
        assert!((pb_c_base() - 19652.0).abs() < f64::EPSILON);
        assert!((pb_c_init() - 1.25).abs() < f64::EPSILON);
        assert!((dirichlet_alpha() - 0.3).abs() < f64::EPSILON);
        assert!((root_exploration_fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_training_defaults() {
        assert_eq!(training_steps(), 7000);
        assert_eq!(checkpoint_interval(), 1000);
        assert_eq!(window_size(), 1_000_000);
        assert_eq!(batch_size(), 4096);
        assert_eq!(network(), "flat");
        assert_eq!(num_actors(), 1);
    }
}
