//! Monte Carlo Tree Search (MCTS) for tic-tac-toe.
//!
//! This crate builds a search tree over [`games_tictactoe::GameState`]
//! positions and picks a move for the player to move.
//!
//! # Overview
//!
//! MCTS builds its tree by running iterations. Each iteration consists of
//! four phases:
//!
//! 1. **Selection**: Descend through fully expanded nodes, maximising the
//!    upper confidence bound on the searching player's turns and minimising
//!    the lower bound on the opponent's turns
//! 2. **Expansion**: At the first node with an untried move, materialise one
//!    untried move (chosen uniformly at random) as a new child
//! 3. **Simulation**: Play the child's position out with a rollout policy
//! 4. **Backpropagation**: Update visit counts and value sums along the path
//!    taken in this iteration
//!
//! Positions are deduplicated by [`games_tictactoe::StateKey`]: a move that
//! reaches a known position links the existing node instead of creating a
//! second one.
//!
//! # Usage
//!
//! ```rust
//! use games_tictactoe::GameState;
//! use mcts::{run_mcts, MctsConfig, RandomRollout};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let state = GameState::new();
//! let config = MctsConfig::for_testing();
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//!
//! let result = run_mcts(&state, &RandomRollout::default(), config, &mut rng).unwrap();
//! assert!(state.is_legal_move(result.action));
//! println!("Best move: {} (Q = {:.3})", result.action, result.mean_value);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `iterations`: Iterations per search (default: 1000)
//! - `exploration`: Exploration constant C (default: 1.0)
//! - `reward_scheme`: How draws are scored (default: neutral, 0)
//! - `final_selection`: Highest mean value or most visits (default: mean value)
//! - `time_limit`: Optional wall-clock cap, checked between iterations
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------+
//! |                      MctsSearch                       |
//! |  +-------------+  +-------------+  +---------------+  |
//! |  |  MctsTree   |  |  GameState  |  | RolloutPolicy |  |
//! |  | (arena+map) |  | (root copy) |  |   (playout)   |  |
//! |  +------+------+  +------+------+  +-------+-------+  |
//! |         |                |                 |          |
//! |         v                v                 v          |
//! |   select -> expand -> simulate -> backpropagate       |
//! +-------------------------------------------------------+
//! ```

pub mod config;
pub mod node;
pub mod rollout;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::{FinalSelection, MctsConfig, RewardScheme};
pub use node::{MctsNode, NodeId};
pub use rollout::{RandomRollout, RolloutError, RolloutPolicy};
pub use search::{run_mcts, search, MctsSearch, SearchError, SearchResult, SearchStats};
pub use tree::{reward_for, ChildStats, MctsTree, TreeStats};
