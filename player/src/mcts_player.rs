//! MCTS-based move selection for the engine's side of the board.

use anyhow::Result;
use games_tictactoe::GameState;
use mcts::{run_mcts, MctsConfig, RandomRollout, SearchResult};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

/// Engine player that searches with random rollouts.
///
/// The RNG lives for the whole session, so a seeded player reproduces
/// every move of every game.
#[derive(Debug)]
pub struct MctsPlayer {
    config: MctsConfig,
    rollout: RandomRollout,
    rng: ChaCha20Rng,
}

impl MctsPlayer {
    /// Create a player seeded from entropy.
    pub fn new(config: MctsConfig) -> Self {
        Self {
            config,
            rollout: RandomRollout::default(),
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create with a specific seed for determinism.
    pub fn with_seed(config: MctsConfig, seed: u64) -> Self {
        Self {
            config,
            rollout: RandomRollout::default(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Search `state` and return the chosen move with its statistics.
    pub fn select_move(&mut self, state: &GameState) -> Result<SearchResult> {
        let result = run_mcts(state, &self.rollout, self.config.clone(), &mut self.rng)?;

        debug!(
            player = %state.current_player(),
            action = %result.action,
            mean_value = result.mean_value,
            visits = result.visits,
            elapsed_ms = result.stats.elapsed.as_millis() as u64,
            "Engine selected move"
        );

        Ok(result)
    }
}
