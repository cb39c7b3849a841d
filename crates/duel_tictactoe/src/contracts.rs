//! Move preconditions and board invariants.
//!
//! Preconditions decide whether a candidate move may be applied;
//! invariants describe what every reachable [`BoardState`] satisfies.

use super::action::{IllegalMoveError, Move};
use super::state::BoardState;
use super::{Cell, Mark};
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Move Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: the target cell is one of the board's legal moves.
pub struct CellIsEmpty;

impl CellIsEmpty {
    /// Checks that the move targets an empty cell.
    #[instrument(skip(state))]
    pub fn check(action: &Move, state: &BoardState) -> Result<(), IllegalMoveError> {
        if state.board().is_empty(action.coord()) {
            Ok(())
        } else {
            Err(IllegalMoveError::CellOccupied(action.coord()))
        }
    }
}

/// Precondition: the move's mark is the side to move.
pub struct MarksTurn;

impl MarksTurn {
    /// Checks that the move carries the mark whose turn it is.
    #[instrument(skip(state))]
    pub fn check(action: &Move, state: &BoardState) -> Result<(), IllegalMoveError> {
        if action.mark() == state.turn() {
            Ok(())
        } else {
            Err(IllegalMoveError::WrongTurn {
                expected: state.turn(),
                found: action.mark(),
            })
        }
    }
}

/// Composite precondition: empty cell and right turn.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(skip(state))]
    pub fn check(action: &Move, state: &BoardState) -> Result<(), IllegalMoveError> {
        CellIsEmpty::check(action, state)?;
        MarksTurn::check(action, state)?;
        Ok(())
    }
}

/// Checks a parsed move against the current board before it is applied.
///
/// Pure: depends only on the state passed in.
pub struct MoveValidator;

impl MoveValidator {
    /// Accepts the move iff its coordinate is in `state.legal_moves()` and
    /// its mark is the side to move.
    #[instrument(skip(state), fields(turn = %state.turn()))]
    pub fn validate(action: &Move, state: &BoardState) -> Result<(), IllegalMoveError> {
        LegalMove::check(action, state)
    }
}

// ─────────────────────────────────────────────────────────────
//  Invariants
// ─────────────────────────────────────────────────────────────

/// Invariant: X leads O by zero or one mark, and the side to move is
/// the one that is behind (X on equal counts).
pub struct MarksBalanced;

impl MarksBalanced {
    /// Returns true if the mark counts agree with the side to move.
    #[instrument(skip(state))]
    pub fn holds(state: &BoardState) -> bool {
        let x_count = state.board().count(Mark::X);
        let o_count = state.board().count(Mark::O);

        let expected_turn = match x_count.checked_sub(o_count) {
            Some(0) => Some(Mark::X),
            Some(1) => Some(Mark::O),
            _ => None,
        };

        let valid = expected_turn == Some(state.turn());
        if !valid {
            warn!(x_count, o_count, turn = %state.turn(), "Mark balance violated");
        }
        valid
    }
}

/// Invariant: history length, move count and filled cells agree.
pub struct HistoryComplete;

impl HistoryComplete {
    /// Returns true if history, counter and grid describe the same game.
    #[instrument(skip(state))]
    pub fn holds(state: &BoardState) -> bool {
        let filled = state
            .board()
            .cells()
            .iter()
            .filter(|c| !matches!(c, Cell::Empty))
            .count();
        let history_len = state.history().len();
        let move_count = usize::from(state.move_count());

        let valid = filled == history_len && history_len == move_count;
        if !valid {
            warn!(filled, history_len, move_count, "History completeness violated");
        }
        valid
    }
}

/// Asserts that all board invariants hold (debug builds only).
#[instrument(skip(state))]
pub fn assert_invariants(state: &BoardState) {
    debug_assert!(MarksBalanced::holds(state), "Mark balance violated");
    debug_assert!(HistoryComplete::holds(state), "History completeness violated");
}
