//! MCTS tree structure with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! A tree lives for a single search.

use engine_core::Player;

use crate::node::{MctsNode, NodeId};

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree<const A: usize> {
    /// Arena storing all nodes
    nodes: Vec<MctsNode<A>>,

    /// Root node index (always 0 after initialization)
    root: NodeId,
}

impl<const A: usize> Default for MctsTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const A: usize> MctsTree<A> {
    /// Create a tree holding a single unevaluated root.
    pub fn new() -> Self {
        Self {
            nodes: vec![MctsNode::new_root()],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode<A> {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode<A> {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode<A>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a child for `action` under `parent_id` and return its ID.
    pub fn add_child(&mut self, parent_id: NodeId, action: usize, prior: f32) -> NodeId {
        debug_assert!(action < A);
        let child_id = self.allocate(MctsNode::new_child(parent_id, action as u8, prior));

        let parent = self.get_mut(parent_id);
        parent.children[action] = child_id;
        parent.child_mask.insert(action);

        child_id
    }

    /// Child with the highest UCB score, as `(action, child)`.
    /// Equal scores resolve to the larger action index.
    pub fn select_child(
        &self,
        node_id: NodeId,
        pb_c_base: f32,
        pb_c_init: f32,
    ) -> Option<(usize, NodeId)> {
        let node = self.get(node_id);
        let parent_visits = node.visit_count;

        node.children().max_by(|(_, id_a), (_, id_b)| {
            let score_a = self.get(*id_a).ucb_score(parent_visits, pb_c_base, pb_c_init);
            let score_b = self.get(*id_b).ucb_score(parent_visits, pb_c_base, pb_c_init);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Backpropagate a leaf evaluation up to the root.
    ///
    /// `value` is from the perspective of `leaf_to_play`. Every node on the
    /// path gains a visit and adds `value` when its own player to move is
    /// `leaf_to_play`, or `1 - value` otherwise.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32, leaf_to_play: Player) {
        let mut current_id = leaf_id;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += if node.to_play == Some(leaf_to_play) {
                value
            } else {
                1.0 - value
            };
            current_id = node.parent;
        }
    }

    /// Visit count of every root child, indexed by action.
    pub fn root_visits(&self) -> [u32; A] {
        let mut visits = [0u32; A];
        for (action, id) in self.get(self.root).children() {
            visits[action] = self.get(id).visit_count;
        }
        visits
    }

    /// Most visited root action as `(action, visits)`.
    /// Equal counts resolve to the larger action index.
    pub fn best_action(&self) -> Option<(usize, u32)> {
        self.get(self.root)
            .children()
            .map(|(action, id)| (action, self.get(id).visit_count))
            .max_by_key(|(_, visits)| *visits)
    }

    /// Root visit counts normalised to a distribution over all `A` actions.
    /// `None` when the root children have no visits.
    pub fn root_policy(&self) -> Option<[f32; A]> {
        let visits = self.root_visits();
        let total: u32 = visits.iter().sum();
        if total == 0 {
            return None;
        }

        let mut policy = [0.0f32; A];
        for (p, &v) in policy.iter_mut().zip(visits.iter()) {
            *p = v as f32 / total as f32;
        }
        Some(policy)
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        self.get(node_id)
            .children()
            .map(|(_, id)| self.compute_max_depth(id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree() {
        let tree = MctsTree::<4>::new();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId(0));
        assert!(tree.get(tree.root()).parent.is_none());
    }

    #[test]
    fn test_add_child() {
        let mut tree = MctsTree::<4>::new();

        let child_id = tree.add_child(tree.root(), 1, 0.5);

        assert_eq!(tree.len(), 2);
        assert_eq!(child_id, NodeId(1));

        let root = tree.get(tree.root());
        assert!(root.is_expanded());
        assert_eq!(root.child(1), Some(NodeId(1)));

        let child = tree.get(child_id);
        assert_eq!(child.parent, tree.root());
        assert_eq!(child.action, 1);
        assert!((child.prior - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_backpropagate_by_player() {
        let mut tree = MctsTree::<4>::new();

        // root (First) -> child (Second) -> grandchild (First)
        let child_id = tree.add_child(tree.root(), 0, 0.5);
        let grandchild_id = tree.add_child(child_id, 1, 0.5);
        tree.get_mut(tree.root()).to_play = Some(Player::First);
        tree.get_mut(child_id).to_play = Some(Player::Second);
        tree.get_mut(grandchild_id).to_play = Some(Player::First);

        tree.backpropagate(grandchild_id, 0.8, Player::First);

        for id in [tree.root(), child_id, grandchild_id] {
            assert_eq!(tree.get(id).visit_count, 1);
        }
        assert!((tree.get(grandchild_id).value_sum - 0.8).abs() < 1e-6);
        assert!((tree.get(child_id).value_sum - 0.2).abs() < 1e-6);
        assert!((tree.get(tree.root()).value_sum - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_select_child_prefers_prior_when_unvisited() {
        let mut tree = MctsTree::<4>::new();
        tree.add_child(tree.root(), 0, 0.3);
        tree.add_child(tree.root(), 1, 0.7);
        tree.get_mut(tree.root()).visit_count = 1;

        let (action, id) = tree.select_child(tree.root(), 19652.0, 1.25).unwrap();
        assert_eq!(action, 1);
        assert_eq!(id, NodeId(2));
    }

    #[test]
    fn test_select_child_ties_go_to_larger_action() {
        let mut tree = MctsTree::<4>::new();
        tree.add_child(tree.root(), 0, 0.25);
        tree.add_child(tree.root(), 2, 0.25);
        tree.add_child(tree.root(), 3, 0.25);

        // No parent visits: every score is 0
        let (action, _) = tree.select_child(tree.root(), 19652.0, 1.25).unwrap();
        assert_eq!(action, 3);
    }

    #[test]
    fn test_select_child_of_leaf() {
        let tree = MctsTree::<4>::new();
        assert!(tree.select_child(tree.root(), 19652.0, 1.25).is_none());
    }

    #[test]
    fn test_root_policy_and_best_action() {
        let mut tree = MctsTree::<4>::new();
        let c1 = tree.add_child(tree.root(), 0, 0.5);
        let c2 = tree.add_child(tree.root(), 2, 0.5);

        assert!(tree.root_policy().is_none());

        tree.get_mut(c1).visit_count = 30;
        tree.get_mut(c2).visit_count = 70;

        let policy = tree.root_policy().unwrap();
        assert!((policy[0] - 0.3).abs() < 1e-6);
        assert!(policy[1].abs() < 1e-6);
        assert!((policy[2] - 0.7).abs() < 1e-6);
        assert!(policy[3].abs() < 1e-6);

        assert_eq!(tree.root_visits(), [30, 0, 70, 0]);
        assert_eq!(tree.best_action(), Some((2, 70)));

        tree.get_mut(c1).visit_count = 70;
        assert_eq!(tree.best_action(), Some((2, 70)));
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = MctsTree::<4>::new();
        let child = tree.add_child(tree.root(), 0, 0.5);
        tree.add_child(child, 3, 1.0);

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.max_depth, 2);
    }
}
