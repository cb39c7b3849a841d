//! First-class move type for tic-tac-toe.
//!
//! A move carries the party that proposed it so a finished game's
//! history can be replayed with attribution.

use super::{Coord, Mark};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A party placing its mark at a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    coord: Coord,
    mark: Mark,
    party: String,
}

impl Move {
    /// Creates a new move.
    #[instrument(skip(party))]
    pub fn new(coord: Coord, mark: Mark, party: impl Into<String>) -> Self {
        Self {
            coord,
            mark,
            party: party.into(),
        }
    }

    /// Target coordinate.
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Mark being placed.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Name of the party that proposed the move.
    pub fn party(&self) -> &str {
        &self.party
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) -> {}", self.party, self.mark, self.coord)
    }
}

/// A well-formed move that breaks the rules.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMoveError {
    /// The target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(Coord),

    /// The move's mark is not the side to move.
    #[display("It is {}'s turn, not {}'s", expected, found)]
    WrongTurn {
        /// Side to move.
        expected: Mark,
        /// Mark carried by the rejected move.
        found: Mark,
    },
}

impl std::error::Error for IllegalMoveError {}
