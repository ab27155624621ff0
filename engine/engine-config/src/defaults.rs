//! Default configuration values loaded from config.defaults.toml.
//!
//! The shared TOML file is embedded at compile time, so the binary and the
//! documented defaults can never drift apart.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
    play: PlayDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct SearchDefaults {
    iterations: u32,
    exploration: f64,
    reward_scheme: String,
    final_selection: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    time_limit_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PlayDefaults {
    human: String,
    games: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Search
pub fn iterations() -> u32 {
    DEFAULTS.search.iterations
}
pub fn exploration() -> f64 {
    DEFAULTS.search.exploration
}
pub fn reward_scheme() -> &'static str {
    &DEFAULTS.search.reward_scheme
}
pub fn final_selection() -> &'static str {
    &DEFAULTS.search.final_selection
}
pub fn seed() -> Option<u64> {
    DEFAULTS.search.seed
}
pub fn time_limit_ms() -> Option<u64> {
    DEFAULTS.search.time_limit_ms
}

// Play
pub fn human() -> &'static str {
    &DEFAULTS.play.human
}
pub fn games() -> u32 {
    DEFAULTS.play.games
}
