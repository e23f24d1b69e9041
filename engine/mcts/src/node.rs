//! MCTS tree node representation.
//!
//! Each node represents the position reached by taking `action` from its
//! parent. Children live in a fixed array indexed by action with a bitmask
//! marking which slots are occupied.

use engine_core::{ActionMask, Player};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the MCTS tree over `A` actions.
#[derive(Debug, Clone)]
pub struct MctsNode<const A: usize> {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action that led to this node from parent
    pub action: u8,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of values backpropagated through this node, each from the
    /// perspective of `to_play`.
    pub value_sum: f32,

    /// Prior probability of choosing `action` at the parent.
    pub prior: f32,

    /// Player to move here. Set when the node is evaluated.
    pub to_play: Option<Player>,

    /// Child per action, `NodeId::NONE` where `child_mask` is clear.
    pub children: [NodeId; A],

    /// Occupied child slots.
    pub child_mask: ActionMask,
}

impl<const A: usize> MctsNode<A> {
    /// Create a new root node. The root prior is never read.
    pub fn new_root() -> Self {
        Self::new_child(NodeId::NONE, 0, 1.0)
    }

    /// Create a new, unevaluated child node.
    pub fn new_child(parent: NodeId, action: u8, prior: f32) -> Self {
        Self {
            parent,
            action,
            visit_count: 0,
            value_sum: 0.0,
            prior,
            to_play: None,
            children: [NodeId::NONE; A],
            child_mask: ActionMask::EMPTY,
        }
    }

    /// Mean backed-up value, 0.0 if never visited.
    #[inline]
    pub fn value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    /// Expanded iff at least one child exists.
    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.child_mask.is_empty()
    }

    #[inline]
    pub fn child(&self, action: usize) -> Option<NodeId> {
        if self.child_mask.contains(action) {
            Some(self.children[action])
        } else {
            None
        }
    }

    /// `(action, child)` pairs in ascending action order.
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.child_mask
            .iter()
            .map(move |action| (action, self.children[action]))
    }

    /// UCB score of this node seen from its parent:
    ///
    /// ```text
    /// pb_c  = ln((N_parent + pb_c_base + 1) / pb_c_base) + pb_c_init
    /// score = pb_c * sqrt(N_parent) / (N + 1) * prior + value
    /// ```
    ///
    /// `N_parent = 0` gives no exploration bonus.
    #[inline]
    pub fn ucb_score(&self, parent_visits: u32, pb_c_base: f32, pb_c_init: f32) -> f32 {
        let parent_visits = parent_visits as f32;
        let pb_c = ((parent_visits + pb_c_base + 1.0) / pb_c_base).ln() + pb_c_init;
        let prior_weight = pb_c * parent_visits.sqrt() / (self.visit_count as f32 + 1.0);
        prior_weight * self.prior + self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::NONE.is_some());
        assert!(!NodeId(0).is_none());
        assert!(NodeId(0).is_some());
    }

    #[test]
    fn test_new_root() {
        let node = MctsNode::<4>::new_root();

        assert!(node.parent.is_none());
        assert_eq!(node.visit_count, 0);
        assert!(node.to_play.is_none());
        assert!(!node.is_expanded());
        assert!(node.children.iter().all(|c| c.is_none()));
    }

    #[test]
    fn test_value() {
        let mut node = MctsNode::<4>::new_root();

        // Unvisited
        assert!(node.value().abs() < 1e-6);

        node.visit_count = 4;
        node.value_sum = 2.0;
        assert!((node.value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ucb_score() {
        let mut node = MctsNode::<4>::new_child(NodeId(0), 1, 0.5);
        node.visit_count = 3;
        node.value_sum = 1.5;

        let (base, init) = (19652.0f32, 1.25f32);
        let pb_c = ((16.0 + base + 1.0) / base).ln() + init;
        let expected = pb_c * 4.0 / 4.0 * 0.5 + 0.5;

        let ucb = node.ucb_score(16, base, init);
        assert!((ucb - expected).abs() < 1e-5);
    }

    #[test]
    fn test_ucb_without_parent_visits_is_value() {
        let mut node = MctsNode::<4>::new_child(NodeId(0), 0, 0.9);
        node.visit_count = 2;
        node.value_sum = 0.6;

        let ucb = node.ucb_score(0, 19652.0, 1.25);
        assert!((ucb - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_child_lookup() {
        let mut node = MctsNode::<4>::new_root();
        node.children[2] = NodeId(7);
        node.child_mask.insert(2);

        assert!(node.is_expanded());
        assert_eq!(node.child(2), Some(NodeId(7)));
        assert_eq!(node.child(1), None);
        assert_eq!(node.children().collect::<Vec<_>>(), vec![(2, NodeId(7))]);
    }
}
