//! Game loops: human against engine, and engine against itself.

use anyhow::{anyhow, Result};
use games_tictactoe::{GameState, Outcome, Player, Position};
use std::fmt;
use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::mcts_player::MctsPlayer;

/// Parse a human move written as `row col` (a comma also works).
pub fn parse_move(line: &str) -> Result<Position> {
    let parts: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();

    match parts.as_slice() {
        [row, col] => {
            let row: u8 = row
                .parse()
                .map_err(|_| anyhow!("row '{}' is not a number", row))?;
            let col: u8 = col
                .parse()
                .map_err(|_| anyhow!("column '{}' is not a number", col))?;
            Ok(Position::new(row, col))
        }
        _ => Err(anyhow!("expected two numbers, e.g. '1 2'")),
    }
}

/// Play one game with a human on `human`'s side, reading moves from `input`.
///
/// Unparseable or illegal moves are reported and asked for again.
pub fn play_human_game<R: BufRead, W: Write>(
    engine: &mut MctsPlayer,
    human: Player,
    input: &mut R,
    output: &mut W,
) -> Result<Outcome> {
    let mut state = GameState::new();
    writeln!(output, "You are {}. Enter moves as 'row col' (0-2).", human)?;

    while !state.is_terminal() {
        writeln!(output, "\n{}", state)?;

        if state.current_player() == human {
            let position = read_human_move(&state, input, output)?;
            state.apply_move(position)?;
        } else {
            let result = engine.select_move(&state)?;
            writeln!(output, "Engine plays {}", result.action)?;
            state.apply_move(result.action)?;
        }
    }

    writeln!(output, "\n{}", state)?;
    let outcome = state.outcome();
    match outcome {
        Outcome::Won(winner) if winner == human => writeln!(output, "You win!")?,
        Outcome::Won(winner) => writeln!(output, "{} wins.", winner)?,
        _ => writeln!(output, "Draw.")?,
    }

    Ok(outcome)
}

fn read_human_move<R: BufRead, W: Write>(
    state: &GameState,
    input: &mut R,
    output: &mut W,
) -> Result<Position> {
    loop {
        write!(output, "Your move ({}): ", state.current_player())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(anyhow!("input closed before the game finished"));
        }

        let position = match parse_move(&line) {
            Ok(position) => position,
            Err(e) => {
                writeln!(output, "Could not read a move: {}", e)?;
                continue;
            }
        };

        // Validate on a copy so a rejected move never touches the game
        let mut probe = *state;
        match probe.apply_move(position) {
            Ok(()) => return Ok(position),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

/// Play one engine-vs-engine game. Returns the outcome and the move count.
pub fn play_engine_game(engine: &mut MctsPlayer) -> Result<(Outcome, u8)> {
    let mut state = GameState::new();
    while !state.is_terminal() {
        let result = engine.select_move(&state)?;
        state.apply_move(result.action)?;
    }
    debug!(board = %state.state_key(), "Self-play game finished");
    Ok((state.outcome(), state.turn_count()))
}

/// Results of a batch of games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub x_wins: u32,
    pub o_wins: u32,
    pub draws: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Won(Player::X) => self.x_wins += 1,
            Outcome::Won(Player::O) => self.o_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Ongoing => {}
        }
    }

    pub fn games(&self) -> u32 {
        self.x_wins + self.o_wins + self.draws
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} games: X won {}, O won {}, {} drawn",
            self.games(),
            self.x_wins,
            self.o_wins,
            self.draws
        )
    }
}

/// Play `games` engine-vs-engine games and count the results.
pub fn play_engine_games(engine: &mut MctsPlayer, games: u32) -> Result<Tally> {
    let mut tally = Tally::default();
    for game in 1..=games {
        let (outcome, moves) = play_engine_game(engine)?;
        tally.record(outcome);
        info!(game, ?outcome, moves, "Game complete");
    }
    Ok(tally)
}
