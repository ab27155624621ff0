//! Rollout policies for leaf evaluation.
//!
//! A rollout plays a position out to the end and reports the outcome. The
//! search only needs the [`RolloutPolicy`] trait; [`RandomRollout`] is the
//! plain uniform playout with no heuristics.

use games_tictactoe::{GameError, GameState, Outcome};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Errors that can occur during a rollout.
#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("Rollout exceeded {0} moves without reaching a terminal state")]
    DepthExceeded(u32),

    #[error("Rollout produced an illegal move: {0}")]
    Game(#[from] GameError),
}

/// Trait for rollout policies.
///
/// Implementations receive their own copy of the state and must return a
/// terminal outcome.
pub trait RolloutPolicy {
    fn rollout(&self, state: GameState, rng: &mut ChaCha20Rng) -> Result<Outcome, RolloutError>;
}

/// Random rollout policy that plays uniformly random legal moves to a
/// terminal state.
#[derive(Debug, Clone)]
pub struct RandomRollout {
    /// Maximum rollout depth to prevent runaway games
    pub max_depth: u32,
}

impl Default for RandomRollout {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl RandomRollout {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl RolloutPolicy for RandomRollout {
    fn rollout(
        &self,
        mut state: GameState,
        rng: &mut ChaCha20Rng,
    ) -> Result<Outcome, RolloutError> {
        let mut depth = 0;
        while !state.is_terminal() {
            if depth >= self.max_depth {
                return Err(RolloutError::DepthExceeded(self.max_depth));
            }
            let moves = state.legal_moves();
            // Non-terminal states always have at least one move
            if let Some(&position) = moves.choose(rng) {
                state.apply_move(position)?;
            }
            depth += 1;
        }
        Ok(state.outcome())
    }
}
