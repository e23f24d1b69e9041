//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared
//! by the self-play actors, the trainer and the command-line binary.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`SUBZERO_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! SUBZERO_<SECTION>_<KEY>=value
//!
//! Examples:
//!     SUBZERO_COMMON_SEED=7
//!     SUBZERO_MCTS_NUM_SIMULATIONS=32
//!     SUBZERO_TRAINING_NETWORK=conv
//!     SUBZERO_SELFPLAY_NUM_ACTORS=4
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_PATH_ENV, CONFIG_SEARCH_PATHS,
};
pub use structs::*;

#[cfg(test)]
mod tests;
