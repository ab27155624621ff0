//! TicTacToe rules for the MCTS engine
//!
//! This crate owns everything the search needs to know about the game:
//! the board, whose turn it is, which moves are legal, when the game is over
//! and a canonical key used to deduplicate positions inside the search tree.
//!
//! # Usage
//!
//! ```rust
//! use games_tictactoe::{GameState, Outcome, Player, Position};
//!
//! let mut state = GameState::new();
//! state.apply_move(Position::new(1, 1)).unwrap();
//!
//! assert_eq!(state.current_player(), Player::O);
//! assert_eq!(state.legal_moves().len(), 8);
//! assert_eq!(state.outcome(), Outcome::Ongoing);
//! assert_eq!(state.state_key().to_string(), "....X....");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of cells on the board.
pub const NUM_CELLS: usize = 9;

/// Side length of the board.
pub const BOARD_SIZE: u8 = 3;

/// Winning lines (rows, columns, diagonals) as row-major cell indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Why a move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("position is off the board")]
    OutOfBounds,

    #[error("cell is already occupied")]
    Occupied,

    #[error("game is already over")]
    GameOver,
}

/// Errors produced by the game rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Illegal move at ({row}, {col}): {reason}")]
    IllegalMove {
        row: u8,
        col: u8,
        reason: MoveRejection,
    },

    #[error("Invalid state key: {0}")]
    InvalidKey(String),
}

/// One of the two players. X always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    /// The other player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Board symbol for this player.
    pub fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Contents of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    X,
    O,
}

impl Cell {
    fn from_player(player: Player) -> Self {
        match player {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    /// The player occupying this cell, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }

    fn key_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

/// A board coordinate. Construction is unchecked so that callers can ask
/// whether an arbitrary coordinate is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Build a position from a row-major index (0-8).
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_CELLS {
            return None;
        }
        Some(Self {
            row: (index / BOARD_SIZE as usize) as u8,
            col: (index % BOARD_SIZE as usize) as u8,
        })
    }

    /// Check that the coordinate lies on the 3x3 board.
    #[inline]
    pub fn is_on_board(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Row-major index. Only meaningful when `is_on_board()`.
    #[inline]
    pub fn index(&self) -> usize {
        self.row as usize * BOARD_SIZE as usize + self.col as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Exactly one of these holds for every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Won(Player),
    Draw,
}

impl Outcome {
    /// Reward from `player`'s perspective: 1.0 for a win, -1.0 for a loss,
    /// 0.0 for a draw or an unfinished game.
    #[inline]
    pub fn reward_for(self, player: Player) -> f32 {
        match self {
            Outcome::Won(winner) if winner == player => 1.0,
            Outcome::Won(_) => -1.0,
            Outcome::Draw | Outcome::Ongoing => 0.0,
        }
    }
}

/// Canonical identifier of a position: one symbol per cell in row-major
/// order (`X`, `O` or `.`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey([Cell; NUM_CELLS]);

impl StateKey {
    pub fn cells(&self) -> &[Cell; NUM_CELLS] {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.key_char())?;
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != NUM_CELLS {
            return Err(GameError::InvalidKey(format!(
                "expected {} cells, got {}",
                NUM_CELLS,
                chars.len()
            )));
        }

        let mut cells = [Cell::Empty; NUM_CELLS];
        for (slot, ch) in cells.iter_mut().zip(chars) {
            *slot = match ch {
                '.' => Cell::Empty,
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                other => {
                    return Err(GameError::InvalidKey(format!(
                        "invalid cell symbol: {:?}",
                        other
                    )))
                }
            };
        }
        Ok(StateKey(cells))
    }
}

/// TicTacToe game state
///
/// A small `Copy` value: the search clones it freely for expansion and
/// rollouts without sharing storage with the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    cells: [Cell; NUM_CELLS],
    turn_count: u8,
    winner: Option<Player>,
}

impl GameState {
    /// Create an empty board with X to move.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; NUM_CELLS],
            turn_count: 0,
            winner: None,
        }
    }

    /// Rebuild a state from its canonical key.
    ///
    /// The turn count is the number of marks on the board, so the key must
    /// describe a position reachable by alternating play starting with X.
    pub fn from_key(key: &StateKey) -> Result<Self, GameError> {
        let cells = key.0;
        let x_count = cells.iter().filter(|&&c| c == Cell::X).count();
        let o_count = cells.iter().filter(|&&c| c == Cell::O).count();

        if x_count != o_count && x_count != o_count + 1 {
            return Err(GameError::InvalidKey(format!(
                "unreachable mark counts: {} X, {} O",
                x_count, o_count
            )));
        }

        let x_wins = Self::has_line(&cells, Cell::X);
        let o_wins = Self::has_line(&cells, Cell::O);
        let winner = match (x_wins, o_wins) {
            (true, true) => {
                return Err(GameError::InvalidKey(
                    "both players have a winning line".to_string(),
                ))
            }
            // X moved last when the counts differ, O otherwise
            (true, false) if x_count == o_count + 1 => Some(Player::X),
            (false, true) if x_count == o_count => Some(Player::O),
            (false, false) => None,
            _ => {
                return Err(GameError::InvalidKey(
                    "winning line does not belong to the last mover".to_string(),
                ))
            }
        };

        Ok(Self {
            cells,
            turn_count: (x_count + o_count) as u8,
            winner,
        })
    }

    /// Number of moves played so far.
    #[inline]
    pub fn turn_count(&self) -> u8 {
        self.turn_count
    }

    /// Player whose turn it is, from the parity of the turn count.
    #[inline]
    pub fn current_player(&self) -> Player {
        if self.turn_count % 2 == 0 {
            Player::X
        } else {
            Player::O
        }
    }

    /// Contents of a cell. Off-board positions read as empty.
    pub fn cell(&self, position: Position) -> Cell {
        if position.is_on_board() {
            self.cells[position.index()]
        } else {
            Cell::Empty
        }
    }

    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// True when someone has won or the board is full.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.turn_count as usize >= NUM_CELLS
    }

    pub fn outcome(&self) -> Outcome {
        match self.winner {
            Some(player) => Outcome::Won(player),
            None if self.is_terminal() => Outcome::Draw,
            None => Outcome::Ongoing,
        }
    }

    /// True iff the position is on the board, empty, and the game is not over.
    pub fn is_legal_move(&self, position: Position) -> bool {
        self.check_move(position).is_ok()
    }

    fn check_move(&self, position: Position) -> Result<(), MoveRejection> {
        if !position.is_on_board() {
            return Err(MoveRejection::OutOfBounds);
        }
        if self.is_terminal() {
            return Err(MoveRejection::GameOver);
        }
        if self.cells[position.index()] != Cell::Empty {
            return Err(MoveRejection::Occupied);
        }
        Ok(())
    }

    /// Empty cells in row-major order. Empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Position> {
        if self.is_terminal() {
            return Vec::new();
        }

        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == Cell::Empty)
            .filter_map(|(idx, _)| Position::from_index(idx))
            .collect()
    }

    /// Bit-mask representation of legal moves.
    ///
    /// Bits 0-8 correspond to row-major cell indices. When the game is
    /// finished the mask is zeroed.
    pub fn legal_moves_mask(&self) -> u16 {
        if self.is_terminal() {
            return 0;
        }

        self.cells
            .iter()
            .enumerate()
            .fold(0u16, |mask, (idx, cell)| {
                if *cell == Cell::Empty {
                    mask | (1u16 << idx)
                } else {
                    mask
                }
            })
    }

    /// Place the current player's mark at `position`.
    ///
    /// The state is left untouched when the move is rejected.
    pub fn apply_move(&mut self, position: Position) -> Result<(), GameError> {
        self.check_move(position)
            .map_err(|reason| GameError::IllegalMove {
                row: position.row,
                col: position.col,
                reason,
            })?;

        let mover = self.current_player();
        let mark = Cell::from_player(mover);
        self.cells[position.index()] = mark;
        self.turn_count += 1;

        if Self::has_line(&self.cells, mark) {
            self.winner = Some(mover);
        }

        Ok(())
    }

    /// Canonical key for this position.
    #[inline]
    pub fn state_key(&self) -> StateKey {
        StateKey(self.cells)
    }

    fn has_line(cells: &[Cell; NUM_CELLS], mark: Cell) -> bool {
        LINES.iter().any(|line| line.iter().all(|&idx| cells[idx] == mark))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(BOARD_SIZE as usize) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| match cell.player() {
                    Some(player) => player.symbol().to_string(),
                    None => "_".to_string(),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
