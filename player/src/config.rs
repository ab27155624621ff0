//! Configuration for the player binary
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use games_tictactoe::Player;
use mcts::{FinalSelection, MctsConfig, RewardScheme};
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_human() -> String {
    CENTRAL_CONFIG.play.human.clone()
}

fn default_games() -> u32 {
    CENTRAL_CONFIG.play.games
}

fn default_iterations() -> u32 {
    CENTRAL_CONFIG.search.iterations
}

fn default_exploration() -> f64 {
    CENTRAL_CONFIG.search.exploration
}

fn default_seed() -> Option<u64> {
    CENTRAL_CONFIG.search.seed
}

fn default_reward_scheme() -> String {
    CENTRAL_CONFIG.search.reward_scheme.clone()
}

fn default_final_selection() -> String {
    CENTRAL_CONFIG.search.final_selection.clone()
}

fn default_time_limit_ms() -> Option<u64> {
    CENTRAL_CONFIG.search.time_limit_ms
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

/// Which side, if any, the human plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Human(Player),
    Nobody,
}

impl FromStr for Seat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Seat::Human(Player::X)),
            "o" => Ok(Seat::Human(Player::O)),
            "none" => Ok(Seat::Nobody),
            other => Err(anyhow!(
                "invalid human side '{}', expected one of x, o, none",
                other
            )),
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Human(player) => write!(f, "{}", player.symbol().to_ascii_lowercase()),
            Seat::Nobody => write!(f, "none"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tictactoe-mcts")]
#[command(about = "Play TicTacToe against a Monte Carlo Tree Search engine")]
#[command(
    long_about = "Plays TicTacToe in the terminal. The engine picks its moves with
Monte Carlo Tree Search over random playouts.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Side played by the human (x, o, or none for engine vs engine)
    #[arg(long, default_value_t = default_human())]
    pub human: String,

    /// Number of engine-vs-engine games when --human none
    #[arg(long, default_value_t = default_games())]
    pub games: u32,

    /// MCTS iterations per move
    #[arg(long, default_value_t = default_iterations())]
    pub iterations: u32,

    /// Exploration constant C
    #[arg(long, default_value_t = default_exploration())]
    pub exploration: f64,

    /// RNG seed for reproducible games (random if unset)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Draw scoring: neutral or draw_as_loss
    #[arg(long, default_value_t = default_reward_scheme())]
    pub reward_scheme: String,

    /// Final move rule: mean_value or most_visited
    #[arg(long, default_value_t = default_final_selection())]
    pub final_selection: String,

    /// Wall-clock limit per engine move in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,
}

impl Config {
    /// Parse CLI arguments, filling optional values the CLI left unset from
    /// the central config.
    pub fn load() -> Self {
        Self::parse().with_central_fallbacks()
    }

    fn with_central_fallbacks(mut self) -> Self {
        self.seed = self.seed.or_else(default_seed);
        self.time_limit_ms = self.time_limit_ms.or_else(default_time_limit_ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.seat()?;
        self.mcts_config()?;

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        if self.seat()? == Seat::Nobody && self.games == 0 {
            return Err(anyhow!("games must be greater than 0 when no human plays"));
        }

        Ok(())
    }

    pub fn seat(&self) -> Result<Seat> {
        self.human.parse()
    }

    /// Build the search configuration, rejecting values the search cannot use.
    pub fn mcts_config(&self) -> Result<MctsConfig> {
        let reward_scheme: RewardScheme = self.reward_scheme.parse().map_err(|e| anyhow!("{}", e))?;
        let final_selection: FinalSelection =
            self.final_selection.parse().map_err(|e| anyhow!("{}", e))?;

        let mut config = MctsConfig::default()
            .with_iterations(self.iterations)
            .with_exploration(self.exploration as f32)
            .with_reward_scheme(reward_scheme)
            .with_final_selection(final_selection);
        if let Some(limit) = self.time_limit() {
            config = config.with_time_limit(limit);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}
