//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Descend from the root by UCB score, applying each action to a clone of the game
//! 2. Evaluation: Ask the evaluator for a value and policy logits at the leaf
//! 3. Expansion: Add one child per legal action with softmax priors
//! 4. Backpropagation: Update statistics along the path using player parity

use std::time::Instant;

use engine_core::{ActionMask, Game};
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;
use tracing::trace;

use crate::config::MctsConfig;
use crate::evaluator::{masked_softmax, Evaluator, EvaluatorError};
use crate::node::NodeId;
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Game error: {0}")]
    GameError(String),

    #[error("Evaluator error: {0}")]
    EvaluatorError(#[from] EvaluatorError),

    #[error("No legal actions available")]
    NoLegalActions,

    #[error("Degenerate distribution: {0}")]
    DegenerateDistribution(String),

    #[error("Corrupt tree: {0}")]
    CorruptTree(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Timing and size counters for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Time spent inside the evaluator (microseconds)
    pub inference_us: u64,
    /// Time spent descending the tree (microseconds)
    pub selection_us: u64,
    /// Time spent backpropagating (microseconds)
    pub backprop_us: u64,
    /// Evaluator calls, including the root
    pub evaluations: u32,
    /// Simulations that ended on a terminal position
    pub terminal_leaves: u32,
    pub tree_nodes: usize,
    pub max_depth: u32,
}

/// Result of an MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult<const A: usize> {
    /// Action to play
    pub action: usize,

    /// Root visit counts normalised over all actions (the policy target)
    pub policy: [f32; A],

    /// Raw root visit counts
    pub visit_counts: [u32; A],

    /// Mean backed-up value at the root
    pub value: f32,

    /// Number of simulations performed
    pub simulations: u32,

    pub stats: SearchStats,
}

/// MCTS search state.
pub struct MctsSearch<'a, G, E, const A: usize>
where
    G: Game<A>,
    E: Evaluator<A> + ?Sized,
{
    tree: MctsTree<A>,
    game: &'a G,
    evaluator: &'a E,
    config: MctsConfig,
    stats: SearchStats,
}

impl<'a, G, E, const A: usize> MctsSearch<'a, G, E, A>
where
    G: Game<A>,
    E: Evaluator<A> + ?Sized,
{
    /// Create a new MCTS search rooted at `game`.
    ///
    /// Fails with `NoLegalActions` when the game is already over.
    pub fn new(game: &'a G, evaluator: &'a E, config: MctsConfig) -> Result<Self, SearchError> {
        config.validate().map_err(SearchError::InvalidConfig)?;
        if game.is_terminal() || game.legal_mask().is_empty() {
            return Err(SearchError::NoLegalActions);
        }

        Ok(Self {
            tree: MctsTree::new(),
            game,
            evaluator,
            config,
            stats: SearchStats::default(),
        })
    }

    /// Run the MCTS search for the configured number of simulations.
    pub fn run(&mut self, rng: &mut ChaCha20Rng) -> Result<SearchResult<A>, SearchError> {
        let root_id = self.tree.root();
        let root_game = self.game;

        // Evaluate and expand the root
        if !self.tree.get(root_id).is_expanded() {
            self.evaluate_leaf(root_id, root_game)?;
        }

        if self.config.uses_root_noise() {
            self.add_exploration_noise(rng)?;
        }

        for _ in 0..self.config.num_simulations {
            self.simulate()?;
        }

        let policy = self.tree.root_policy().ok_or_else(|| {
            SearchError::DegenerateDistribution("root children have no visits".into())
        })?;
        let action = self.select_action(rng)?;

        let tree_stats = self.tree.stats();
        self.stats.tree_nodes = tree_stats.total_nodes;
        self.stats.max_depth = tree_stats.max_depth;

        Ok(SearchResult {
            action,
            policy,
            visit_counts: self.tree.root_visits(),
            value: tree_stats.root_value,
            simulations: tree_stats.root_visits,
            stats: self.stats.clone(),
        })
    }

    /// Run a single simulation (select -> evaluate/expand -> backpropagate).
    fn simulate(&mut self) -> Result<(), SearchError> {
        let select_start = Instant::now();
        let mut game = self.game.clone();
        let mut node_id = self.tree.root();
        let mut depth = 0u32;

        while self.tree.get(node_id).is_expanded() {
            let (action, child_id) = self
                .tree
                .select_child(node_id, self.config.pb_c_base, self.config.pb_c_init)
                .ok_or_else(|| {
                    SearchError::CorruptTree(format!(
                        "expanded node {} yielded no child",
                        node_id.0
                    ))
                })?;
            game.apply(action)
                .map_err(|e| SearchError::GameError(e.to_string()))?;
            node_id = child_id;
            depth += 1;
        }
        self.stats.selection_us += select_start.elapsed().as_micros() as u64;

        let value = self.evaluate_leaf(node_id, &game)?;

        let backprop_start = Instant::now();
        self.tree.backpropagate(node_id, value, game.to_play());
        self.stats.backprop_us += backprop_start.elapsed().as_micros() as u64;

        trace!(
            leaf = node_id.0,
            depth = depth,
            value = value,
            "MCTS simulation complete"
        );

        Ok(())
    }

    /// Evaluate `game` at `node_id` and expand it over the legal actions.
    ///
    /// Terminal positions are evaluated but stay leaves. Returns the
    /// evaluator's value for backpropagation.
    fn evaluate_leaf(&mut self, node_id: NodeId, game: &G) -> Result<f32, SearchError> {
        let inference_start = Instant::now();
        let eval = self.evaluator.evaluate(&game.observation())?;
        self.stats.inference_us += inference_start.elapsed().as_micros() as u64;
        self.stats.evaluations += 1;

        self.tree.get_mut(node_id).to_play = Some(game.to_play());

        if game.is_terminal() {
            self.stats.terminal_leaves += 1;
            return Ok(eval.value);
        }

        let legal: ActionMask = game.legal_mask().iter().filter(|&a| a < A).collect();
        if legal.is_empty() {
            return Ok(eval.value);
        }

        let priors = masked_softmax(&eval.logits, legal).ok_or_else(|| {
            SearchError::DegenerateDistribution(format!(
                "policy logits do not normalise over {:?}",
                legal
            ))
        })?;
        for action in legal.iter() {
            self.tree.add_child(node_id, action, priors[action]);
        }

        Ok(eval.value)
    }

    /// Mix Dirichlet noise into the root children's priors.
    fn add_exploration_noise(&mut self, rng: &mut ChaCha20Rng) -> Result<(), SearchError> {
        let root_id = self.tree.root();
        let children: Vec<NodeId> = self
            .tree
            .get(root_id)
            .children()
            .map(|(_, id)| id)
            .collect();

        if children.is_empty() {
            return Ok(());
        }

        let noise = dirichlet_noise(children.len(), self.config.dirichlet_alpha, rng)?;
        let frac = self.config.root_exploration_fraction;

        for (child_id, n) in children.into_iter().zip(noise) {
            let child = self.tree.get_mut(child_id);
            child.prior = child.prior * (1.0 - frac) + n * frac;
        }
        Ok(())
    }

    /// Sample from the softmax of root visit counts during the opening,
    /// otherwise take the most visited action.
    fn select_action(&self, rng: &mut ChaCha20Rng) -> Result<usize, SearchError> {
        let sampling = self.game.moves_played() < self.config.num_sampling_moves as usize;

        if sampling {
            let root = self.tree.get(self.tree.root());
            let counts = self.tree.root_visits().map(|v| v as f32);
            let probs = masked_softmax(&counts, root.child_mask).ok_or_else(|| {
                SearchError::DegenerateDistribution("root has no children to sample".into())
            })?;
            sample_action(&probs, rng)
        } else {
            self.tree
                .best_action()
                .map(|(action, _)| action)
                .ok_or_else(|| {
                    SearchError::DegenerateDistribution("root has no children to pick".into())
                })
        }
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree<A> {
        &self.tree
    }
}

/// Sample an action index from a probability distribution.
fn sample_action(policy: &[f32], rng: &mut ChaCha20Rng) -> Result<usize, SearchError> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &p) in policy.iter().enumerate() {
        cumsum += p;
        if r < cumsum {
            return Ok(i);
        }
    }

    // Fallback to last non-zero action (handles floating point issues)
    for (i, &p) in policy.iter().enumerate().rev() {
        if p > 0.0 {
            return Ok(i);
        }
    }

    Err(SearchError::DegenerateDistribution(
        "policy has no probability mass".into(),
    ))
}

/// Generate Dirichlet-distributed noise using Gamma variates.
fn dirichlet_noise(n: usize, alpha: f32, rng: &mut ChaCha20Rng) -> Result<Vec<f32>, SearchError> {
    let gamma = Gamma::new(alpha as f64, 1.0)
        .map_err(|e| SearchError::InvalidConfig(format!("dirichlet_alpha {}: {}", alpha, e)))?;
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    // Normalize
    let sum: f32 = samples.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for s in &mut samples {
            *s /= sum;
        }
    } else {
        // Every variate underflowed
        samples.fill(1.0 / n as f32);
    }

    Ok(samples)
}

/// Convenience function to run a single MCTS search.
pub fn run_mcts<G, E, const A: usize>(
    game: &G,
    evaluator: &E,
    config: MctsConfig,
    rng: &mut ChaCha20Rng,
) -> Result<SearchResult<A>, SearchError>
where
    G: Game<A>,
    E: Evaluator<A> + ?Sized,
{
    let mut search = MctsSearch::new(game, evaluator, config)?;
    search.run(rng)
}
