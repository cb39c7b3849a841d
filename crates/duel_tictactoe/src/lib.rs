//! Pure tic-tac-toe logic for model-driven matches.
//!
//! This crate holds everything about a game that does not involve waiting
//! on anyone:
//!
//! - **[`BoardState`]**: the authoritative grid, side to move and history
//! - **[`MoveParser`]**: strict `"row col"` parsing of untrusted text
//! - **[`MoveValidator`]**: legality of a parsed move against a board
//! - **[`rules`]**: win and full-board detection over any grid
//!
//! # Example
//!
//! ```
//! use duel_tictactoe::{BoardState, Mark, Move, MoveParser, MoveValidator};
//!
//! let mut state = BoardState::new();
//! let coord = MoveParser::parse("1 1").unwrap();
//! let action = Move::new(coord, Mark::X, "Player X");
//! MoveValidator::validate(&action, &state).unwrap();
//! state.apply(action).unwrap();
//! assert_eq!(state.turn(), Mark::O);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod contracts;
mod outcome;
mod parser;
mod state;
mod types;

pub mod rules;

pub use action::{IllegalMoveError, Move};
pub use contracts::{
    CellIsEmpty, HistoryComplete, LegalMove, MarksBalanced, MarksTurn, MoveValidator,
    assert_invariants,
};
pub use outcome::Outcome;
pub use parser::{MoveParser, ParseError};
pub use state::{BoardState, BoardView};
pub use types::{BOARD_SIZE, Board, Cell, Coord, Mark};
