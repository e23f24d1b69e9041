//! MCTS configuration parameters.

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run per search.
    pub num_simulations: u32,

    /// Moves at the start of a game whose action is sampled from the
    /// softmax of root visit counts. Later moves take the most visited action.
    pub num_sampling_moves: u32,

    /// Visit scale of the exploration term. The exploration coefficient
    /// grows as `ln((N + pb_c_base + 1) / pb_c_base)`.
    pub pb_c_base: f32,

    /// Base exploration coefficient.
    pub pb_c_init: f32,

    /// Dirichlet concentration for root noise.
    pub dirichlet_alpha: f32,

    /// Share of each root prior replaced by noise. 0.0 disables noise.
    pub root_exploration_fraction: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 8,
            num_sampling_moves: 5,
            pb_c_base: 19652.0,
            pb_c_init: 1.25,
            dirichlet_alpha: 0.3,
            root_exploration_fraction: 0.25,
        }
    }
}

impl MctsConfig {
    /// Create config for self-play (with exploration noise).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for evaluation (no noise, greedy selection).
    pub fn for_evaluation() -> Self {
        Self {
            num_sampling_moves: 0,
            root_exploration_fraction: 0.0,
            ..Self::default()
        }
    }

    /// Create a deterministic config for testing.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            num_sampling_moves: 0,
            root_exploration_fraction: 0.0,
            ..Self::default()
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Builder pattern: set the number of sampled opening moves.
    pub fn with_sampling_moves(mut self, n: u32) -> Self {
        self.num_sampling_moves = n;
        self
    }

    /// Builder pattern: set both exploration constants.
    pub fn with_exploration(mut self, pb_c_base: f32, pb_c_init: f32) -> Self {
        self.pb_c_base = pb_c_base;
        self.pb_c_init = pb_c_init;
        self
    }

    /// Builder pattern: set root noise.
    pub fn with_root_noise(mut self, alpha: f32, fraction: f32) -> Self {
        self.dirichlet_alpha = alpha;
        self.root_exploration_fraction = fraction;
        self
    }

    /// Whether root priors get Dirichlet noise.
    #[inline]
    pub fn uses_root_noise(&self) -> bool {
        self.root_exploration_fraction > 0.0
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_simulations == 0 {
            return Err("num_simulations must be at least 1".into());
        }
        if self.pb_c_base.is_nan() || self.pb_c_base <= 0.0 {
            return Err(format!("pb_c_base must be positive, got {}", self.pb_c_base));
        }
        if !self.pb_c_init.is_finite() || self.pb_c_init < 0.0 {
            return Err(format!(
                "pb_c_init must be a non-negative number, got {}",
                self.pb_c_init
            ));
        }
        if !(0.0..=1.0).contains(&self.root_exploration_fraction) {
            return Err(format!(
                "root_exploration_fraction must be in [0, 1], got {}",
                self.root_exploration_fraction
            ));
        }
        let bad_alpha = self.dirichlet_alpha.is_nan() || self.dirichlet_alpha <= 0.0;
        if self.uses_root_noise() && bad_alpha {
            return Err(format!(
                "dirichlet_alpha must be positive when root noise is on, got {}",
                self.dirichlet_alpha
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 8);
        assert_eq!(config.num_sampling_moves, 5);
        assert!((config.pb_c_base - 19652.0).abs() < 1e-3);
        assert!((config.pb_c_init - 1.25).abs() < 1e-6);
        assert!(config.uses_root_noise());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_simulations(100)
            .with_sampling_moves(0)
            .with_root_noise(0.5, 0.1);

        assert_eq!(config.num_simulations, 100);
        assert_eq!(config.num_sampling_moves, 0);
        assert!((config.dirichlet_alpha - 0.5).abs() < 1e-6);
        assert!((config.root_exploration_fraction - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_evaluation_config() {
        let config = MctsConfig::for_evaluation();
        assert!(!config.uses_root_noise());
        assert_eq!(config.num_sampling_moves, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MctsConfig::default().with_simulations(0).validate().is_err());
        assert!(MctsConfig::default()
            .with_exploration(0.0, 1.25)
            .validate()
            .is_err());
        assert!(MctsConfig::default()
            .with_root_noise(0.3, 1.5)
            .validate()
            .is_err());
        assert!(MctsConfig::default()
            .with_root_noise(0.0, 0.25)
            .validate()
            .is_err());
        // Alpha is irrelevant without noise
        assert!(MctsConfig::default()
            .with_root_noise(0.0, 0.0)
            .validate()
            .is_ok());
    }
}
