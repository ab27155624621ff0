//! tictactoe-mcts - play TicTacToe against a Monte Carlo Tree Search engine
//!
//! Two modes:
//! 1. `--human x|o`: a human enters moves on stdin, the engine answers
//! 2. `--human none`: the engine plays itself `--games` times and reports a tally

use anyhow::Result;
use std::io;
use tracing::{error, info};

mod config;
mod game;
mod mcts_player;

use crate::config::{Config, Seat};
use crate::mcts_player::MctsPlayer;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so they never interleave with the board on stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    // Parse configuration
    let config = Config::load();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let mcts_config = config.mcts_config()?;
    info!(
        iterations = mcts_config.iterations,
        exploration = mcts_config.exploration,
        reward_scheme = %mcts_config.reward_scheme,
        final_selection = %mcts_config.final_selection,
        seed = ?config.seed,
        "Engine configured"
    );

    let mut engine = match config.seed {
        Some(seed) => MctsPlayer::with_seed(mcts_config, seed),
        None => MctsPlayer::new(mcts_config),
    };

    let run_result = match config.seat()? {
        Seat::Human(human) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            game::play_human_game(&mut engine, human, &mut input, &mut output)
                .map(|outcome| info!(?outcome, "Game finished"))
        }
        Seat::Nobody => game::play_engine_games(&mut engine, config.games).map(|tally| {
            info!(
                games = tally.games(),
                x_wins = tally.x_wins,
                o_wins = tally.o_wins,
                draws = tally.draws,
                "Self-play complete"
            );
            println!("{}", tally);
        }),
    };

    match run_result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Play failed: {}", e);
            Err(e)
        }
    }
}
