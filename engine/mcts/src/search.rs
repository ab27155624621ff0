//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse fully expanded nodes using UCB/LCB to a frontier
//! 2. Expansion: Materialise one untried move as a new child
//! 3. Simulation: Play the child's position out with a rollout policy
//! 4. Backpropagation: Update statistics along the traversed path

use std::time::{Duration, Instant};

use games_tictactoe::{GameError, GameState, Position};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::node::NodeId;
use crate::rollout::{RandomRollout, RolloutError, RolloutPolicy};
use crate::tree::{ChildStats, MctsTree};

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Iteration budget must be positive, got {0}")]
    InvalidBudget(u32),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Rollout error: {0}")]
    Rollout(#[from] RolloutError),
}

/// Summary of one search call.
#[derive(Debug, Clone)]
pub struct SearchStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    /// Mean value at the root, from the view of the player who moved into it.
    pub root_value: f32,
    pub max_depth: u32,
    pub elapsed: Duration,
    /// True when the time limit ended the search before the budget did.
    pub stopped_early: bool,
}

/// Result of an MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move to play
    pub action: Position,

    /// Mean value of the chosen child, from the searching player's view
    pub mean_value: f32,

    /// Visit count of the chosen child
    pub visits: u32,

    /// Number of iterations performed
    pub iterations: u32,

    /// Statistics for every root child, in expansion order
    pub children: Vec<ChildStats>,

    pub stats: SearchStats,
}

/// MCTS search state.
pub struct MctsSearch<'a, R: RolloutPolicy> {
    tree: MctsTree,
    root_state: GameState,
    rollout: &'a R,
    config: MctsConfig,
}

impl<'a, R: RolloutPolicy> MctsSearch<'a, R> {
    /// Create a new MCTS search from the given game state.
    pub fn new(
        root_state: GameState,
        rollout: &'a R,
        config: MctsConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        if root_state.is_terminal() {
            return Err(SearchError::NoLegalMoves);
        }

        Ok(Self {
            tree: MctsTree::new(&root_state),
            root_state,
            rollout,
            config,
        })
    }

    /// Run the MCTS search for the configured number of iterations.
    pub fn run(&mut self, rng: &mut ChaCha20Rng) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        let mut iterations = 0;
        let mut stopped_early = false;

        while iterations < self.config.iterations {
            if let Some(limit) = self.config.time_limit {
                if iterations > 0 && start.elapsed() >= limit {
                    stopped_early = true;
                    break;
                }
            }
            self.iterate(rng)?;
            iterations += 1;
        }

        // Extract result
        let (action, child_id) = self
            .tree
            .best_action(self.config.final_selection)
            .ok_or(SearchError::NoLegalMoves)?;
        let child = self.tree.get(child_id);
        let tree_stats = self.tree.stats();

        let result = SearchResult {
            action,
            mean_value: child.mean_value(),
            visits: child.visit_count,
            iterations,
            children: self.tree.root_children(),
            stats: SearchStats {
                total_nodes: tree_stats.total_nodes,
                root_visits: tree_stats.root_visits,
                root_value: tree_stats.root_value,
                max_depth: tree_stats.max_depth,
                elapsed: start.elapsed(),
                stopped_early,
            },
        };

        debug!(
            action = %result.action,
            mean_value = result.mean_value,
            visits = result.visits,
            iterations,
            nodes = result.stats.total_nodes,
            stopped_early,
            "MCTS search complete"
        );

        Ok(result)
    }

    /// Run a single iteration (select -> expand -> simulate -> backpropagate).
    fn iterate(&mut self, rng: &mut ChaCha20Rng) -> Result<(), SearchError> {
        // Selection: traverse to a frontier or terminal node
        let (mut path, mut state) = self.select()?;
        let mut leaf_id = *path.last().ok_or(SearchError::NoLegalMoves)?;

        // Expansion, unless the walk ended on a terminal node
        let mut created = false;
        if self.tree.get(leaf_id).is_frontier() {
            let (child_id, child_state, is_new) = self.expand(leaf_id, &state, rng)?;
            path.push(child_id);
            leaf_id = child_id;
            state = child_state;
            created = is_new;
        }

        // Simulation
        let outcome = self.rollout.rollout(state, rng)?;

        // Backpropagation
        self.tree
            .backpropagate(&path, outcome, self.config.reward_scheme, created);

        trace!(
            leaf = leaf_id.0,
            path_len = path.len(),
            created,
            ?outcome,
            "MCTS iteration complete"
        );

        Ok(())
    }

    /// Walk from the root through fully expanded nodes, replaying each edge's
    /// move on a copy of the root state.
    fn select(&self) -> Result<(Vec<NodeId>, GameState), SearchError> {
        let mut path = vec![self.tree.root()];
        let mut current = self.tree.root();
        let mut state = self.root_state;

        loop {
            let node = self.tree.get(current);

            // Stop at terminal or frontier nodes
            if node.is_terminal || !node.is_fully_expanded() {
                break;
            }

            match self.tree.select_child(current, self.config.exploration) {
                Some((action, child_id)) => {
                    state.apply_move(action)?;
                    path.push(child_id);
                    current = child_id;
                }
                None => break,
            }
        }

        Ok((path, state))
    }

    /// Expand one untried move of `node_id`, chosen uniformly at random.
    /// Returns the child, its state and whether the node is new.
    fn expand(
        &mut self,
        node_id: NodeId,
        state: &GameState,
        rng: &mut ChaCha20Rng,
    ) -> Result<(NodeId, GameState, bool), SearchError> {
        let action = *self
            .tree
            .get(node_id)
            .untried
            .choose(rng)
            .ok_or_else(|| SearchError::InvalidState("frontier node has no untried moves".into()))?;

        let mut child_state = *state;
        child_state.apply_move(action)?;

        let (child_id, created) = self.tree.add_child(node_id, action, &child_state);
        Ok((child_id, child_state, created))
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }
}

/// Convenience function to run a single MCTS search.
pub fn run_mcts<R: RolloutPolicy>(
    state: &GameState,
    rollout: &R,
    config: MctsConfig,
    rng: &mut ChaCha20Rng,
) -> Result<SearchResult, SearchError> {
    let mut search = MctsSearch::new(*state, rollout, config)?;
    search.run(rng)
}

/// Pick a move for the player to move in `state` using random rollouts and
/// default settings with the given iteration budget.
pub fn search(
    state: &GameState,
    iterations: u32,
    rng: &mut ChaCha20Rng,
) -> Result<Position, SearchError> {
    let config = MctsConfig::default().with_iterations(iterations);
    run_mcts(state, &RandomRollout::default(), config, rng).map(|result| result.action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FinalSelection, RewardScheme};
    use games_tictactoe::Player;
    use rand::SeedableRng;

    fn state_after(moves: &[(u8, u8)]) -> GameState {
        let mut state = GameState::new();
        for &(row, col) in moves {
            state.apply_move(Position::new(row, col)).unwrap();
        }
        state
    }

    /// X | X | _
    /// O | O | _
    /// _ | _ | _
    ///
    /// X to move, (0, 2) wins immediately.
    fn x_can_win() -> GameState {
        state_after(&[(0, 0), (1, 0), (0, 1), (1, 1)])
    }

    #[test]
    fn test_single_iteration_expands_one_child() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default().with_iterations(1);
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let mut search = MctsSearch::new(GameState::new(), &rollout, config).unwrap();
        let result = search.run(&mut rng).unwrap();

        let tree = search.tree();
        let root = tree.get(tree.root());
        assert_eq!(tree.node_count(), 2);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.visit_count, 2);
        assert!((result.stats.root_value - root.mean_value()).abs() < 1e-6);

        let (action, child_id) = root.children[0];
        assert_eq!(tree.get(child_id).visit_count, 1);
        assert_eq!(result.action, action);
        assert_eq!(result.visits, 1);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_root_visits_count_iterations() {
        let rollout = RandomRollout::default();
        for n in [1u32, 10, 100, 1000] {
            let config = MctsConfig::default().with_iterations(n);
            let mut rng = ChaCha20Rng::seed_from_u64(u64::from(n));
            let mut search = MctsSearch::new(GameState::new(), &rollout, config).unwrap();
            let result = search.run(&mut rng).unwrap();

            let tree = search.tree();
            assert_eq!(tree.get(tree.root()).visit_count, n + 1);
            assert_eq!(result.stats.root_visits, n + 1);

            // Every iteration passes through exactly one root child
            let child_visits: u32 = result.children.iter().map(|c| c.visits).sum();
            assert_eq!(child_visits, n);
        }
    }

    #[test]
    fn test_every_node_has_a_visit() {
        let rollout = RandomRollout::default();
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut search = MctsSearch::new(GameState::new(), &rollout, MctsConfig::default()).unwrap();
        search.run(&mut rng).unwrap();

        let tree = search.tree();
        for node in tree.arena() {
            assert!(node.visit_count >= 1);

            // Parent links always lead back to the root
            let mut current = tree.lookup(&node.key).unwrap();
            let mut hops = 0;
            while tree.get(current).parent.is_some() {
                current = tree.get(current).parent;
                hops += 1;
            }
            assert_eq!(current, tree.root());
            assert_eq!(hops, node.depth);
        }
    }

    #[test]
    fn test_node_visits_cover_subtree() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default().with_iterations(3000);
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let mut search = MctsSearch::new(GameState::new(), &rollout, config).unwrap();
        let result = search.run(&mut rng).unwrap();

        let tree = search.tree();
        let mut in_links = vec![0u32; tree.node_count()];
        for node in tree.arena() {
            for &(_, child) in &node.children {
                in_links[child.0 as usize] += 1;
            }
        }

        let mut checked = 0;
        for node in tree.arena() {
            // Shared children also collect visits routed through other parents
            if node.children.is_empty()
                || node.children.iter().any(|(_, c)| in_links[c.0 as usize] > 1)
            {
                continue;
            }
            let below: u32 = node
                .children
                .iter()
                .map(|&(_, c)| tree.get(c).visit_count)
                .sum();
            assert!(
                node.visit_count >= 1 + below,
                "{} has {} visits but its children hold {}",
                node.key,
                node.visit_count,
                below
            );
            checked += 1;
        }
        assert!(checked > 0);

        let deepest = tree.arena().iter().map(|n| n.depth).max().unwrap();
        assert_eq!(result.stats.max_depth, deepest);
    }

    #[test]
    fn test_search_is_deterministic() {
        let rollout = RandomRollout::default();
        let state = state_after(&[(1, 1)]);
        let run = || {
            let mut rng = ChaCha20Rng::seed_from_u64(1234);
            run_mcts(&state, &rollout, MctsConfig::default().with_iterations(300), &mut rng)
                .unwrap()
        };

        let first = run();
        let second = run();
        assert_eq!(first.action, second.action);
        assert_eq!(first.visits, second.visits);
        assert_eq!(first.children, second.children);
        assert_eq!(first.stats.total_nodes, second.stats.total_nodes);
    }

    #[test]
    fn test_terminal_root_is_rejected() {
        let rollout = RandomRollout::default();

        // X O X / X O O / O X X
        let drawn = state_after(&[
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 1),
            (1, 0),
            (1, 2),
            (2, 1),
            (2, 0),
            (2, 2),
        ]);
        assert!(matches!(
            MctsSearch::new(drawn, &rollout, MctsConfig::default()),
            Err(SearchError::NoLegalMoves)
        ));

        let mut won = x_can_win();
        won.apply_move(Position::new(0, 2)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert!(matches!(
            search(&won, 100, &mut rng),
            Err(SearchError::NoLegalMoves)
        ));
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default().with_iterations(0);
        assert!(matches!(
            MctsSearch::new(GameState::new(), &rollout, config),
            Err(SearchError::InvalidBudget(0))
        ));
    }

    #[test]
    fn test_finds_winning_move() {
        // Statistical check over seeded runs
        let state = x_can_win();
        let runs = 100u64;
        let correct = (0..runs)
            .filter(|&seed| {
                let mut rng = ChaCha20Rng::seed_from_u64(seed);
                search(&state, 500, &mut rng).unwrap() == Position::new(0, 2)
            })
            .count();

        assert!(
            correct as f64 >= runs as f64 * 0.95,
            "winning move found in only {}/{} runs",
            correct,
            runs
        );
    }

    #[test]
    fn test_winning_move_has_positive_value() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default().with_iterations(500);
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let mut search = MctsSearch::new(x_can_win(), &rollout, config).unwrap();
        let result = search.run(&mut rng).unwrap();

        assert_eq!(result.action, Position::new(0, 2));
        // Every visit to the winning child is an immediate win
        assert!((result.mean_value - 1.0).abs() < 1e-6);

        let tree = search.tree();
        let winning = tree.lookup(&{
            let mut s = x_can_win();
            s.apply_move(Position::new(0, 2)).unwrap();
            s.state_key()
        });
        let winning = tree.get(winning.unwrap());
        assert!(winning.is_terminal);
        assert_eq!(winning.mover, Some(Player::X));

        // The winning move should also be the most explored
        let most_visited = result.children.iter().max_by_key(|c| c.visits).unwrap();
        assert_eq!(most_visited.action, Position::new(0, 2));
    }

    #[test]
    fn test_most_visited_selection_finds_winning_move() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default()
            .with_iterations(500)
            .with_final_selection(FinalSelection::MostVisited);
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        let result = run_mcts(&x_can_win(), &rollout, config, &mut rng).unwrap();
        assert_eq!(result.action, Position::new(0, 2));
    }

    #[test]
    fn test_o_finds_winning_move() {
        // X | X | _
        // O | O | _
        // X | _ | _
        // O to move, (1, 2) wins
        let state = state_after(&[(0, 0), (1, 0), (0, 1), (1, 1), (2, 0)]);
        assert_eq!(state.current_player(), Player::O);

        let mut rng = ChaCha20Rng::seed_from_u64(21);
        assert_eq!(search(&state, 500, &mut rng).unwrap(), Position::new(1, 2));
    }

    #[test]
    fn test_result_is_legal_from_midgame() {
        let rollout = RandomRollout::default();
        let state = state_after(&[(1, 1), (0, 0), (2, 2)]);
        for (seed, scheme) in [(1, RewardScheme::Neutral), (2, RewardScheme::DrawAsLoss)] {
            let config = MctsConfig::for_testing().with_reward_scheme(scheme);
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let result = run_mcts(&state, &rollout, config, &mut rng).unwrap();
            assert!(state.is_legal_move(result.action));
            assert!(result.children.iter().all(|c| state.is_legal_move(c.action)));
        }
    }

    #[test]
    fn test_children_are_unique_moves() {
        let rollout = RandomRollout::default();
        let mut rng = ChaCha20Rng::seed_from_u64(77);
        let mut search = MctsSearch::new(GameState::new(), &rollout, MctsConfig::default()).unwrap();
        search.run(&mut rng).unwrap();

        let tree = search.tree();
        for node in tree.arena() {
            let mut actions: Vec<usize> = node.children.iter().map(|(p, _)| p.index()).collect();
            let total = actions.len();
            actions.sort_unstable();
            actions.dedup();
            assert_eq!(actions.len(), total, "duplicate edge under {}", node.key);
            assert!(node
                .untried
                .iter()
                .all(|p| !node.children.iter().any(|(c, _)| c == p)));
        }
        // Nine root moves, all expanded after the budget
        assert_eq!(tree.get(tree.root()).children.len(), 9);
    }

    #[test]
    fn test_time_limit_stops_between_iterations() {
        let rollout = RandomRollout::default();
        let config = MctsConfig::default()
            .with_iterations(1000)
            .with_time_limit(Duration::ZERO);
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let result = run_mcts(&GameState::new(), &rollout, config, &mut rng).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(result.stats.stopped_early);
    }
}
