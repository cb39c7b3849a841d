//! Authoritative board state.
//!
//! [`BoardState`] owns the grid, the side to move and the history.
//! [`BoardState::apply`] is its only mutator.

use super::action::{IllegalMoveError, Move};
use super::contracts::{LegalMove, assert_invariants};
use super::outcome::Outcome;
use super::{Board, Cell, Coord, Mark, rules};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Read-only projection of the board handed to move providers.
///
/// A view is a snapshot; nothing done to it reaches the authoritative state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct BoardView {
    board: Board,
    turn: Mark,
}

impl BoardView {
    /// The grid at the time the view was taken.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> Mark {
        self.turn
    }
}

/// Grid, side to move, move count and history of one game.
///
/// Serializable for reporting but not deserializable: a state is only ever
/// built by [`BoardState::apply`] or [`BoardState::replay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardState {
    board: Board,
    turn: Mark,
    move_count: u8,
    history: Vec<Move>,
}

impl BoardState {
    /// Creates an empty board with X to move.
    #[instrument]
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Mark::X,
            move_count: 0,
            history: Vec::new(),
        }
    }

    /// Returns the grid.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    /// Number of moves applied so far (0-9).
    pub fn move_count(&self) -> u8 {
        self.move_count
    }

    /// Applied moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Takes a read-only snapshot for a move provider.
    pub fn view(&self) -> BoardView {
        BoardView::new(self.board.clone(), self.turn)
    }

    /// Returns every empty cell.
    #[instrument(skip(self))]
    pub fn legal_moves(&self) -> BTreeSet<Coord> {
        Coord::ALL
            .into_iter()
            .filter(|coord| self.board.is_empty(*coord))
            .collect()
    }

    /// Places the move's mark, records it and passes the turn.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMoveError::CellOccupied`] if the target is not empty
    /// and [`IllegalMoveError::WrongTurn`] if the move's mark is not the
    /// side to move. The state is untouched on error.
    #[instrument(skip(self), fields(turn = %self.turn, move_count = self.move_count))]
    pub fn apply(&mut self, action: Move) -> Result<(), IllegalMoveError> {
        LegalMove::check(&action, self)?;

        self.board
            .set(action.coord(), Cell::Occupied(action.mark()));
        self.turn = action.mark().opponent();
        self.move_count += 1;
        debug!(action = %action, "Move applied");
        self.history.push(action);

        assert_invariants(self);
        Ok(())
    }

    /// Owner of the first uniform, non-empty line, if any.
    pub fn winner(&self) -> Option<Mark> {
        rules::check_winner(&self.board)
    }

    /// True once all 9 moves have been applied.
    pub fn is_full(&self) -> bool {
        let full = self.move_count == 9;
        debug_assert_eq!(full, rules::is_full(&self.board), "move count disagrees with grid");
        full
    }

    /// Decides the board: a win is checked before a draw, so a winning
    /// ninth move is reported as a win.
    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(mark) = self.winner() {
            Some(Outcome::Winner(mark))
        } else if self.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    /// Applies `moves` in order to a fresh board.
    ///
    /// # Errors
    ///
    /// Returns the first [`IllegalMoveError`] encountered.
    #[instrument(skip(moves), fields(moves = moves.len()))]
    pub fn replay(moves: &[Move]) -> Result<Self, IllegalMoveError> {
        let mut state = Self::new();
        for action in moves {
            state.apply(action.clone())?;
        }
        Ok(state)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
