//! Win detection logic for tic-tac-toe.

use crate::{Board, Cell, Coord, Mark};
use tracing::instrument;

const fn at(row: u8, col: u8) -> Coord {
    Coord::ALL[(row * 3 + col) as usize]
}

/// The 8 winning lines, scanned in this order.
pub const LINES: [[Coord; 3]; 8] = [
    // Rows
    [at(0, 0), at(0, 1), at(0, 2)],
    [at(1, 0), at(1, 1), at(1, 2)],
    [at(2, 0), at(2, 1), at(2, 2)],
    // Columns
    [at(0, 0), at(1, 0), at(2, 0)],
    [at(0, 1), at(1, 1), at(2, 1)],
    [at(0, 2), at(1, 2), at(2, 2)],
    // Diagonals
    [at(0, 0), at(1, 1), at(2, 2)],
    [at(0, 2), at(1, 1), at(2, 0)],
];

fn line_owner(board: &Board, [a, b, c]: [Coord; 3]) -> Option<Mark> {
    match board.get(a) {
        Cell::Occupied(mark) if board.get(b) == board.get(a) && board.get(c) == board.get(a) => {
            Some(mark)
        }
        _ => None,
    }
}

/// Returns the owner of the first uniform, non-empty line.
///
/// Deterministic: on a (necessarily illegal) board with several
/// winning lines, the earliest in [`LINES`] order is reported.
#[instrument(skip(board))]
pub fn check_winner(board: &Board) -> Option<Mark> {
    LINES.into_iter().find_map(|line| line_owner(board, line))
}

/// Returns every uniform, non-empty line together with its owner.
#[instrument(skip(board))]
pub fn winning_lines(board: &Board) -> Vec<([Coord; 3], Mark)> {
    LINES
        .into_iter()
        .filter_map(|line| line_owner(board, line).map(|mark| (line, mark)))
        .collect()
}
