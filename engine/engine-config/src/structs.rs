//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_iterations() -> u32 {
    defaults::iterations()
}
fn d_exploration() -> f64 {
    defaults::exploration()
}
fn d_reward_scheme() -> String {
    defaults::reward_scheme().into()
}
fn d_final_selection() -> String {
    defaults::final_selection().into()
}
fn d_seed() -> Option<u64> {
    defaults::seed()
}
fn d_time_limit_ms() -> Option<u64> {
    defaults::time_limit_ms()
}
fn d_human() -> String {
    defaults::human().into()
}
fn d_games() -> u32 {
    defaults::games()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub play: PlayConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// Monte Carlo search configuration.
///
/// Enumerated settings stay strings here; the player parses them into the
/// search crate's types so this crate stays free of engine dependencies.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    #[serde(default = "d_exploration")]
    pub exploration: f64,
    #[serde(default = "d_reward_scheme")]
    pub reward_scheme: String,
    #[serde(default = "d_final_selection")]
    pub final_selection: String,
    /// Fixed RNG seed (None = seed from entropy)
    #[serde(default = "d_seed")]
    pub seed: Option<u64>,
    /// Wall-clock cap per move in milliseconds (None = iteration budget only)
    #[serde(default = "d_time_limit_ms")]
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::iterations(),
            exploration: defaults::exploration(),
            reward_scheme: defaults::reward_scheme().into(),
            final_selection: defaults::final_selection().into(),
            seed: defaults::seed(),
            time_limit_ms: defaults::time_limit_ms(),
        }
    }
}

/// Interactive play configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlayConfig {
    /// Side played by the human: "x", "o" or "none"
    #[serde(default = "d_human")]
    pub human: String,
    /// Engine-vs-engine games to play when no human is seated
    #[serde(default = "d_games")]
    pub games: u32,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            human: defaults::human().into(),
            games: defaults::games(),
        }
    }
}
