//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](crate::Board). Board storage and turn
//! bookkeeping live elsewhere so these can be checked against any grid,
//! including ones no legal game could reach.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{LINES, check_winner, winning_lines};
