//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from a crate directory)
];

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SUBZERO_CONFIG";

/// Load the central configuration.
///
/// Searches for a config file in the following order:
/// 1. Path specified by the `SUBZERO_CONFIG` environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from {}: {}", CONFIG_PATH_ENV, path.display());
            return load_from_path(&path);
        }
        warn!(
            "{}={} not found, searching defaults",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// An unreadable or malformed file falls back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
    // Optional parseable field
    ($config:expr, $section:ident . $field:ident, $key:expr, optional_parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = Some(v);
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: SUBZERO_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "SUBZERO_COMMON_LOG_LEVEL");
    env_override!(config, common.seed, "SUBZERO_COMMON_SEED", optional_parse);

    // Game
    env_override!(config, game.bonus, "SUBZERO_GAME_BONUS", parse);
    env_override!(config, game.penalty, "SUBZERO_GAME_PENALTY", parse);
    env_override!(config, game.max_moves, "SUBZERO_GAME_MAX_MOVES", parse);
    env_override!(config, game.board_min, "SUBZERO_GAME_BOARD_MIN", parse);
    env_override!(config, game.board_max, "SUBZERO_GAME_BOARD_MAX", parse);

    // MCTS
    env_override!(
        config,
        mcts.num_simulations,
        "SUBZERO_MCTS_NUM_SIMULATIONS",
        parse
    );
    env_override!(
        config,
        mcts.num_sampling_moves,
        "SUBZERO_MCTS_NUM_SAMPLING_MOVES",
        parse
    );
    env_override!(config, mcts.pb_c_base, "SUBZERO_MCTS_PB_C_BASE", parse);
    env_override!(config, mcts.pb_c_init, "SUBZERO_MCTS_PB_C_INIT", parse);
    env_override!(
        config,
        mcts.dirichlet_alpha,
        "SUBZERO_MCTS_DIRICHLET_ALPHA",
        parse
    );
    env_override!(
        config,
        mcts.root_exploration_fraction,
        "SUBZERO_MCTS_ROOT_EXPLORATION_FRACTION",
        parse
    );

    // Self-play
    env_override!(
        config,
        selfplay.num_actors,
        "SUBZERO_SELFPLAY_NUM_ACTORS",
        parse
    );
    env_override!(
        config,
        selfplay.num_episodes,
        "SUBZERO_SELFPLAY_NUM_EPISODES",
        parse
    );
    env_override!(
        config,
        selfplay.warmup_games,
        "SUBZERO_SELFPLAY_WARMUP_GAMES",
        parse
    );
    env_override!(
        config,
        selfplay.log_interval,
        "SUBZERO_SELFPLAY_LOG_INTERVAL",
        parse
    );

    // Training
    env_override!(
        config,
        training.training_steps,
        "SUBZERO_TRAINING_TRAINING_STEPS",
        parse
    );
    env_override!(
        config,
        training.checkpoint_interval,
        "SUBZERO_TRAINING_CHECKPOINT_INTERVAL",
        parse
    );
    env_override!(
        config,
        training.window_size,
        "SUBZERO_TRAINING_WINDOW_SIZE",
        parse
    );
    env_override!(
        config,
        training.batch_size,
        "SUBZERO_TRAINING_BATCH_SIZE",
        parse
    );
    env_override!(
        config,
        training.learning_rate,
        "SUBZERO_TRAINING_LEARNING_RATE",
        parse
    );
    env_override!(
        config,
        training.weight_decay,
        "SUBZERO_TRAINING_WEIGHT_DECAY",
        parse
    );
    env_override!(
        config,
        training.lr_step_size,
        "SUBZERO_TRAINING_LR_STEP_SIZE",
        parse
    );
    env_override!(
        config,
        training.lr_gamma,
        "SUBZERO_TRAINING_LR_GAMMA",
        parse
    );
    env_override!(config, training.network, "SUBZERO_TRAINING_NETWORK");
    env_override!(
        config,
        training.hidden_size,
        "SUBZERO_TRAINING_HIDDEN_SIZE",
        parse
    );
    env_override!(
        config,
        training.eval_episodes,
        "SUBZERO_TRAINING_EVAL_EPISODES",
        parse
    );

    config
}
