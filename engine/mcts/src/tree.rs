//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. A key index deduplicates positions
//! reached through different move orders within one search.

use std::collections::HashMap;

use games_tictactoe::{GameState, Outcome, Player, Position, StateKey};

use crate::config::{FinalSelection, RewardScheme};
use crate::node::{MctsNode, NodeId};

/// Reward of `outcome` for `player` under `scheme`.
#[inline]
pub fn reward_for(outcome: Outcome, player: Player, scheme: RewardScheme) -> f32 {
    match outcome {
        Outcome::Won(_) => outcome.reward_for(player),
        Outcome::Draw => scheme.draw_reward(),
        Outcome::Ongoing => 0.0,
    }
}

/// Per-child statistics reported at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStats {
    pub action: Position,
    pub visits: u32,
    pub mean_value: f32,
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Canonical key -> node, for deduplication
    by_key: HashMap<StateKey, NodeId>,

    /// Root node index (always 0 after initialization)
    root: NodeId,

    /// Deepest node created so far
    max_depth: u32,
}

impl MctsTree {
    /// Create a new tree rooted at `state`.
    pub fn new(state: &GameState) -> Self {
        let root_node = MctsNode::new_root(
            state.state_key(),
            state.current_player(),
            state.legal_moves(),
        );
        let mut by_key = HashMap::new();
        by_key.insert(root_node.key, NodeId(0));
        Self {
            nodes: vec![root_node],
            by_key,
            root: NodeId(0),
            max_depth: 0,
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Player to move at the root; the search maximises for this player.
    #[inline]
    pub fn root_player(&self) -> Player {
        self.get(self.root).to_move
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Find the node for a position, if it has been expanded.
    #[inline]
    pub fn lookup(&self, key: &StateKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Allocate a new node, register its key and return its ID.
    pub fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.max_depth = self.max_depth.max(node.depth);
        self.by_key.insert(node.key, id);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree (never zero).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode] {
        &self.nodes
    }

    /// Select a child of a fully expanded node.
    ///
    /// Children are scored from the root player's perspective. On the root
    /// player's turns the child with the highest upper bound wins; on the
    /// opponent's turns the child with the lowest lower bound wins. Ties go to
    /// the first child in expansion order. Returns the edge's move with the
    /// child, since a shared child may have been created from another parent.
    pub fn select_child(&self, node_id: NodeId, c: f32) -> Option<(Position, NodeId)> {
        let node = self.get(node_id);
        let root_player = self.root_player();
        // Pre-compute ln once instead of per-child comparison
        let parent_visits_ln = (node.visit_count as f32).ln();
        let maximise = node.to_move == root_player;

        let mut best: Option<((Position, NodeId), f32)> = None;
        for &(action, child_id) in &node.children {
            let child = self.get(child_id);
            let score = if maximise {
                child.ucb_score(root_player, parent_visits_ln, c)
            } else {
                child.lcb_score(root_player, parent_visits_ln, c)
            };

            let better = match best {
                None => true,
                Some((_, best_score)) if maximise => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if better {
                best = Some(((action, child_id), score));
            }
        }

        best.map(|(edge, _)| edge)
    }

    /// Add a child to a parent node.
    ///
    /// If the resulting position already has a node (a transposition), that
    /// node is linked under `parent_id` and keeps its original parent.
    /// Returns the child's NodeId and whether it was newly created.
    pub fn add_child(
        &mut self,
        parent_id: NodeId,
        action: Position,
        state: &GameState,
    ) -> (NodeId, bool) {
        let key = state.state_key();
        let (child_id, created) = match self.lookup(&key) {
            Some(existing) => (existing, false),
            None => {
                let parent = self.get(parent_id);
                let child = MctsNode::new_child(
                    parent_id,
                    action,
                    parent.to_move,
                    parent.depth + 1,
                    key,
                    state.legal_moves(),
                );
                (self.allocate(child), true)
            }
        };

        // Add to parent's children
        let parent = self.get_mut(parent_id);
        parent.untried.retain(|&p| p != action);
        parent.children.push((action, child_id));

        (child_id, created)
    }

    /// Backpropagate a rollout outcome along the traversed path (root first).
    ///
    /// Each node receives the reward of the player who entered it; the root
    /// is entered by the opponent of the player to move there. A leaf created
    /// in this iteration already counted its visit at creation.
    pub fn backpropagate(
        &mut self,
        path: &[NodeId],
        outcome: Outcome,
        scheme: RewardScheme,
        leaf_created: bool,
    ) {
        let last = path.len().saturating_sub(1);
        for (depth, &node_id) in path.iter().enumerate().rev() {
            let node = self.get_mut(node_id);
            let player = node.mover.unwrap_or_else(|| node.to_move.opponent());
            let reward = reward_for(outcome, player, scheme);
            let count_visit = !(leaf_created && depth == last);
            node.record(reward, count_visit);
        }
    }

    /// Get the best move from the root.
    /// Returns (move, child NodeId) or None if root has no children.
    pub fn best_action(&self, selection: FinalSelection) -> Option<(Position, NodeId)> {
        let root = self.get(self.root);
        let mut best: Option<(Position, NodeId)> = None;

        for &(action, child_id) in &root.children {
            let child = self.get(child_id);
            let better = match best {
                None => true,
                Some((_, best_id)) => {
                    let incumbent = self.get(best_id);
                    match selection {
                        FinalSelection::MeanValue => child.mean_value() > incumbent.mean_value(),
                        FinalSelection::MostVisited => child.visit_count > incumbent.visit_count,
                    }
                }
            };
            if better {
                best = Some((action, child_id));
            }
        }

        best
    }

    /// Statistics of every root child in expansion order.
    pub fn root_children(&self) -> Vec<ChildStats> {
        self.get(self.root)
            .children
            .iter()
            .map(|&(action, id)| {
                let child = self.get(id);
                ChildStats {
                    action,
                    visits: child.visit_count,
                    mean_value: child.mean_value(),
                }
            })
            .collect()
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.max_depth,
        }
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

    fn state_after(moves: &[(u8, u8)]) -> GameState {
        let mut state = GameState::new();
        for &(row, col) in moves {
            state.apply_move(Position::new(row, col)).unwrap();
        }
        state
    }

    /// Expand `action` from `parent_id`, whose position is `parent_state`.
    fn expand(
        tree: &mut MctsTree,
        parent_id: NodeId,
        parent_state: &GameState,
        action: Position,
    ) -> (NodeId, GameState) {
        let mut state = *parent_state;
        state.apply_move(action).unwrap();
        let (id, _) = tree.add_child(parent_id, action, &state);
        (id, state)
    }

    #[test]
    fn test_new_tree() {
        let tree = MctsTree::new(&GameState::new());

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root(), NodeId(0));
        assert_eq!(tree.root_player(), Player::X);

        let root = tree.get(tree.root());
        assert!(root.parent.is_none());
        assert_eq!(root.visit_count, 1);
        assert_eq!(tree.lookup(&GameState::new().state_key()), Some(NodeId(0)));
    }

    #[test]
    fn test_add_child() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        let (child_id, state) = expand(&mut tree, root, &start, Position::new(1, 1));

        assert_eq!(tree.node_count(), 2);
        assert_eq!(child_id, NodeId(1));

        let root = tree.get(tree.root());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0], (Position::new(1, 1), NodeId(1)));
        assert_eq!(root.untried.len(), 8);
        assert!(!root.untried.contains(&Position::new(1, 1)));

        let child = tree.get(child_id);
        assert_eq!(child.parent, tree.root());
        assert_eq!(child.action, Some(Position::new(1, 1)));
        assert_eq!(child.mover, Some(Player::X));
        assert_eq!(child.key, state.state_key());
        assert_eq!(tree.lookup(&state.state_key()), Some(child_id));
    }

    #[test]
    fn test_add_child_deduplicates_transpositions() {
        let start = state_after(&[(0, 0), (1, 1)]);
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        // Same position via X(0,1) O(2,2) X(0,2) and X(0,2) O(2,2) X(0,1)
        let (a, sa) = expand(&mut tree, root, &start, Position::new(0, 1));
        let (b, sb) = expand(&mut tree, a, &sa, Position::new(2, 2));
        let (c, _) = expand(&mut tree, b, &sb, Position::new(0, 2));

        let (d, sd) = expand(&mut tree, root, &start, Position::new(0, 2));
        let (e, se) = expand(&mut tree, d, &sd, Position::new(2, 2));
        let mut transposed = se;
        transposed.apply_move(Position::new(0, 1)).unwrap();
        let (shared, created) = tree.add_child(e, Position::new(0, 1), &transposed);

        assert!(!created);
        assert_eq!(shared, c);
        assert_eq!(tree.node_count(), 6);
        // Parent is never rewritten
        assert_eq!(tree.get(shared).parent, b);
        assert!(tree.get(e).children.contains(&(Position::new(0, 1), c)));

        // Both routes are three moves long
        assert_eq!(tree.get(shared).depth, 3);
        assert_eq!(tree.stats().max_depth, 3);
    }

    #[test]
    fn test_backpropagate() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        // Create a chain: root -> child (X moved) -> grandchild (O moved)
        let (child_id, child_state) = expand(&mut tree, root, &start, Position::new(0, 0));
        let (grandchild_id, _) = expand(&mut tree, child_id, &child_state, Position::new(1, 1));

        let path = [tree.root(), child_id, grandchild_id];

        // X wins; the grandchild was just created
        tree.backpropagate(&path, Outcome::Won(Player::X), RewardScheme::Neutral, true);

        // Check visits: the new leaf already counted its creation
        assert_eq!(tree.get(grandchild_id).visit_count, 1);
        assert_eq!(tree.get(child_id).visit_count, 2);
        assert_eq!(tree.get(tree.root()).visit_count, 2);

        // Rewards follow whoever entered each node
        assert!((tree.get(grandchild_id).value_sum - (-1.0)).abs() < 1e-6); // O moved
        assert!((tree.get(child_id).value_sum - 1.0).abs() < 1e-6); // X moved
        assert!((tree.get(tree.root()).value_sum - (-1.0)).abs() < 1e-6); // entered by O
    }

    #[test]
    fn test_backpropagate_draw_schemes() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();
        let (child_id, _) = expand(&mut tree, root, &start, Position::new(0, 0));
        let path = [tree.root(), child_id];

        tree.backpropagate(&path, Outcome::Draw, RewardScheme::Neutral, false);
        assert!((tree.get(child_id).value_sum).abs() < 1e-6);

        tree.backpropagate(&path, Outcome::Draw, RewardScheme::DrawAsLoss, false);
        assert!((tree.get(child_id).value_sum - (-1.0)).abs() < 1e-6);
        assert!((tree.get(tree.root()).value_sum - (-1.0)).abs() < 1e-6);
        assert_eq!(tree.get(child_id).visit_count, 3);
        assert_eq!(tree.get(tree.root()).visit_count, 3);
    }

    #[test]
    fn test_select_child_maximises_for_root_player() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        let (a, _) = expand(&mut tree, root, &start, Position::new(0, 0));
        let (b, _) = expand(&mut tree, root, &start, Position::new(1, 1));

        // Equal visits: better mean wins for X
        tree.get_mut(a).visit_count = 10;
        tree.get_mut(a).value_sum = -2.0;
        tree.get_mut(b).visit_count = 10;
        tree.get_mut(b).value_sum = 6.0;
        tree.get_mut(tree.root()).visit_count = 21;

        assert_eq!(
            tree.select_child(tree.root(), 1.0),
            Some((Position::new(1, 1), b))
        );
    }

    #[test]
    fn test_select_child_minimises_on_opponent_turn() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();
        let (x_move, x_state) = expand(&mut tree, root, &start, Position::new(1, 1));

        // O replies; values are stored from O's point of view
        let (good_for_o, _) = expand(&mut tree, x_move, &x_state, Position::new(0, 0));
        let (bad_for_o, _) = expand(&mut tree, x_move, &x_state, Position::new(0, 1));
        tree.get_mut(good_for_o).visit_count = 10;
        tree.get_mut(good_for_o).value_sum = 8.0;
        tree.get_mut(bad_for_o).visit_count = 10;
        tree.get_mut(bad_for_o).value_sum = -8.0;
        tree.get_mut(x_move).visit_count = 21;

        // Lowest bound for X is O's strongest reply
        assert_eq!(
            tree.select_child(x_move, 1.0),
            Some((Position::new(0, 0), good_for_o))
        );
    }

    #[test]
    fn test_select_child_ties_pick_first() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();
        let (first, _) = expand(&mut tree, root, &start, Position::new(2, 2));
        expand(&mut tree, root, &start, Position::new(0, 0));
        expand(&mut tree, root, &start, Position::new(1, 1));

        assert_eq!(
            tree.select_child(tree.root(), 1.0),
            Some((Position::new(2, 2), first))
        );
    }

    #[test]
    fn test_best_action() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        let (a, _) = expand(&mut tree, root, &start, Position::new(0, 0));
        let (b, _) = expand(&mut tree, root, &start, Position::new(1, 1));

        tree.get_mut(a).visit_count = 30;
        tree.get_mut(a).value_sum = 3.0;
        tree.get_mut(b).visit_count = 5;
        tree.get_mut(b).value_sum = 4.0;

        assert_eq!(
            tree.best_action(FinalSelection::MeanValue),
            Some((Position::new(1, 1), b))
        );
        assert_eq!(
            tree.best_action(FinalSelection::MostVisited),
            Some((Position::new(0, 0), a))
        );

        let stats = tree.root_children();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].visits, 30);
        assert!((stats[1].mean_value - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_best_action_empty_root() {
        let tree = MctsTree::new(&GameState::new());
        assert!(tree.best_action(FinalSelection::MeanValue).is_none());
    }

    #[test]
    fn test_tree_stats() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();
        expand(&mut tree, root, &start, Position::new(0, 0));

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 2);
        assert_eq!(stats.max_depth, 1);
        assert_eq!(stats.root_visits, 1);
        assert!(stats.root_value.abs() < 1e-6);
    }

    #[test]
    fn test_max_depth_tracks_deepest_creation() {
        let start = GameState::new();
        let mut tree = MctsTree::new(&start);
        let root = tree.root();

        let (a, sa) = expand(&mut tree, root, &start, Position::new(0, 0));
        let (b, sb) = expand(&mut tree, a, &sa, Position::new(1, 1));
        expand(&mut tree, b, &sb, Position::new(2, 2));
        assert_eq!(tree.stats().max_depth, 3);

        // A shallower branch leaves the maximum alone
        expand(&mut tree, root, &start, Position::new(0, 1));
        assert_eq!(tree.stats().max_depth, 3);
        assert_eq!(tree.get(b).depth, 2);
    }

    #[test]
    fn test_reward_for() {
        let won = Outcome::Won(Player::O);
        assert_eq!(reward_for(won, Player::O, RewardScheme::Neutral), 1.0);
        assert_eq!(reward_for(won, Player::X, RewardScheme::DrawAsLoss), -1.0);
        assert_eq!(reward_for(Outcome::Draw, Player::X, RewardScheme::Neutral), 0.0);
        assert_eq!(
            reward_for(Outcome::Draw, Player::X, RewardScheme::DrawAsLoss),
            -1.0
        );
    }
}
