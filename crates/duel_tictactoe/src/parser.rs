//! Strict parsing of a provider's raw move text.
//!
//! The accepted form is exactly `"<row> <col>"`: two whitespace-separated
//! plain decimal integers in `0..=2`. Anything else, including a correct
//! pair wrapped in commentary, a sign (`+1`) or a leading zero (`01`), is
//! rejected rather than guessed at.

use super::{Coord, types::BOARD_SIZE};
use tracing::{debug, instrument};

/// Why a raw response could not be read as a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ParseError {
    /// The text did not split into exactly two tokens.
    #[display("Expected 2 whitespace-separated numbers, found {} token(s)", _0)]
    TokenCount(usize),

    /// A token was not a plain decimal integer.
    #[display("Token {:?} is not a plain integer", _0)]
    NotAnInteger(String),

    /// An integer was outside `0..=2`.
    #[display("Value {} is outside 0..=2", _0)]
    OutOfRange(i64),
}

impl std::error::Error for ParseError {}

/// Parser for `"row col"` move text.
pub struct MoveParser;

impl MoveParser {
    /// Parses `raw` into a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on a wrong token count, a non-integer token,
    /// or a value off the board.
    #[instrument]
    pub fn parse(raw: &str) -> Result<Coord, ParseError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let [row, col] = tokens.as_slice() else {
            debug!(tokens = tokens.len(), "Wrong token count");
            return Err(ParseError::TokenCount(tokens.len()));
        };

        let row = Self::component(row)?;
        let col = Self::component(col)?;

        Coord::new(row, col).ok_or_else(|| {
            let off_board = if row >= BOARD_SIZE { row } else { col };
            ParseError::OutOfRange(i64::from(off_board))
        })
    }

    /// Reads one token as a byte-sized value; the board bound is left to
    /// [`Coord::new`].
    fn component(token: &str) -> Result<u8, ParseError> {
        let value = Self::plain_integer(token)
            .ok_or_else(|| ParseError::NotAnInteger(token.to_string()))?;
        u8::try_from(value).map_err(|_| ParseError::OutOfRange(value))
    }

    /// `-?[0-9]+` without a leading zero, except `0` itself (`-0` is not plain).
    fn plain_integer(token: &str) -> Option<i64> {
        let digits = token.strip_prefix('-').unwrap_or(token);
        let plain = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (token == "0" || !digits.starts_with('0'));
        if plain { token.parse().ok() } else { None }
    }
}
