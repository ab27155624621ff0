//! MCTS configuration parameters.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::search::SearchError;

/// How rollout outcomes are scored for the player who entered a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardScheme {
    /// Win +1, loss -1, draw 0.
    #[default]
    Neutral,
    /// Win +1, anything else -1. Biases the search away from drawing lines.
    DrawAsLoss,
}

impl RewardScheme {
    /// Score a drawn rollout.
    #[inline]
    pub fn draw_reward(self) -> f32 {
        match self {
            RewardScheme::Neutral => 0.0,
            RewardScheme::DrawAsLoss => -1.0,
        }
    }
}

impl FromStr for RewardScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "neutral" => Ok(RewardScheme::Neutral),
            "draw_as_loss" => Ok(RewardScheme::DrawAsLoss),
            other => Err(format!(
                "unknown reward scheme '{}' (expected neutral or draw_as_loss)",
                other
            )),
        }
    }
}

impl fmt::Display for RewardScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardScheme::Neutral => write!(f, "neutral"),
            RewardScheme::DrawAsLoss => write!(f, "draw_as_loss"),
        }
    }
}

/// Rule used to pick the move returned after the budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalSelection {
    /// Root child with the highest mean value.
    #[default]
    MeanValue,
    /// Root child with the most visits.
    MostVisited,
}

impl FromStr for FinalSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mean_value" => Ok(FinalSelection::MeanValue),
            "most_visited" => Ok(FinalSelection::MostVisited),
            other => Err(format!(
                "unknown final selection '{}' (expected mean_value or most_visited)",
                other
            )),
        }
    }
}

impl fmt::Display for FinalSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalSelection::MeanValue => write!(f, "mean_value"),
            FinalSelection::MostVisited => write!(f, "most_visited"),
        }
    }
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate iterations per search.
    pub iterations: u32,

    /// Exploration constant C in the confidence bound
    /// `mean + C * sqrt(ln(N_parent) / N_child)`.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub exploration: f32,

    /// Reward assigned to drawn rollouts.
    pub reward_scheme: RewardScheme,

    /// How the final move is chosen among the root's children.
    pub final_selection: FinalSelection,

    /// Optional wall-clock limit, checked between iterations.
    pub time_limit: Option<Duration>,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            exploration: 1.0,
            reward_scheme: RewardScheme::Neutral,
            final_selection: FinalSelection::MeanValue,
            time_limit: None,
        }
    }
}

impl MctsConfig {
    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            iterations: 50,
            ..Self::default()
        }
    }

    /// Builder pattern: set number of iterations.
    pub fn with_iterations(mut self, n: u32) -> Self {
        self.iterations = n;
        self
    }

    /// Builder pattern: set exploration constant.
    pub fn with_exploration(mut self, c: f32) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set reward scheme.
    pub fn with_reward_scheme(mut self, scheme: RewardScheme) -> Self {
        self.reward_scheme = scheme;
        self
    }

    /// Builder pattern: set final move selection.
    pub fn with_final_selection(mut self, selection: FinalSelection) -> Self {
        self.final_selection = selection;
        self
    }

    /// Builder pattern: set wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Reject budgets and constants the search cannot run with.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.iterations == 0 {
            return Err(SearchError::InvalidBudget(self.iterations));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "exploration constant must be finite and non-negative, got {}",
                self.exploration
            )));
        }
        Ok(())
    }
}
