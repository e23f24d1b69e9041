//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert!(config.common.seed.is_none());
    assert!((config.game.bonus - 10.0).abs() < f64::EPSILON);
    assert!((config.game.penalty - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.game.max_moves, 300);
    assert_eq!(config.mcts.num_simulations, 8);
}

#[test]
fn test_training_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.training.training_steps, 7000);
    assert_eq!(config.training.checkpoint_interval, 1000);
    assert_eq!(config.training.window_size, 1_000_000);
    assert_eq!(config.training.batch_size, 4096);
    assert!((config.training.learning_rate - 0.002).abs() < f64::EPSILON);
    assert!((config.training.weight_decay - 0.0001).abs() < f64::EPSILON);
    assert_eq!(config.training.lr_step_size, 200_000);
    assert!((config.training.lr_gamma - 0.1).abs() < f64::EPSILON);
    assert_eq!(config.training.network, "flat");
    assert_eq!(config.training.hidden_size, 128);
    assert_eq!(config.training.eval_episodes, 10);
}

#[test]
fn test_selfplay_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.selfplay.num_actors, 1);
    assert_eq!(config.selfplay.num_episodes, 100);
    assert_eq!(config.selfplay.warmup_games, 1);
}

#[test]
fn test_mcts_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.mcts.num_sampling_moves, 5);
    assert!((config.mcts.pb_c_base - 19652.0).abs() < f64::EPSILON);
    assert!((config.mcts.pb_c_init - 1.25).abs() < f64::EPSILON);
    assert!((config.mcts.dirichlet_alpha - 0.3).abs() < f64::EPSILON);
    assert!((config.mcts.root_exploration_fraction - 0.25).abs() < f64::EPSILON);
}

#[test]
fn test_env_overrides() {
    std::env::set_var("SUBZERO_MCTS_NUM_SIMULATIONS", "64");
    std::env::set_var("SUBZERO_COMMON_SEED", "7");
    std::env::set_var("SUBZERO_TRAINING_NETWORK", "conv");

    let config = load_config();
    assert_eq!(config.mcts.num_simulations, 64);
    assert_eq!(config.common.seed, Some(7));
    assert_eq!(config.training.network, "conv");

    std::env::remove_var("SUBZERO_MCTS_NUM_SIMULATIONS");
    std::env::remove_var("SUBZERO_COMMON_SEED");
    std::env::remove_var("SUBZERO_TRAINING_NETWORK");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("SUBZERO_GAME_MAX_MOVES", "lots");
    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.game.max_moves, 300);
    std::env::remove_var("SUBZERO_GAME_MAX_MOVES");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"
seed = 42

[game]
bonus = 20.0
max_moves = 50

[training]
training_steps = 10
batch_size = 32
network = "conv"
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.common.seed, Some(42));
    assert!((config.game.bonus - 20.0).abs() < f64::EPSILON);
    assert_eq!(config.game.max_moves, 50);
    assert_eq!(config.training.training_steps, 10);
    assert_eq!(config.training.batch_size, 32);
    assert_eq!(config.training.network, "conv");
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[mcts]
num_simulations = 100
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.mcts.num_simulations, 100);
    assert_eq!(config.mcts.num_sampling_moves, 5); // Default
    assert_eq!(config.game.board_max, 100); // Default
    assert_eq!(config.selfplay.num_actors, 1); // Default
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[selfplay]\nnum_actors = 3\nwarmup_games = 5").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.selfplay.num_actors, 3);
    assert_eq!(config.selfplay.warmup_games, 5);
    assert_eq!(config.selfplay.num_episodes, 100);
}

#[test]
fn test_load_from_malformed_path_falls_back() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.mcts.num_sampling_moves, 5);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.log_level, cloned.common.log_level);
    assert_eq!(config.training.network, cloned.training.network);
}
