//! Local provider that takes the first empty cell (offline play and demos).

use super::{MoveProvider, ProviderError, RawResponse};
use duel_tictactoe::{BoardView, Coord};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

/// Picks the first legal move in row-major order.
pub struct FirstFreeProvider {
    name: String,
}

impl FirstFreeProvider {
    /// Creates a new first-free provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait::async_trait]
impl MoveProvider for FirstFreeProvider {
    async fn request_move(
        &mut self,
        _view: &BoardView,
        legal_moves: &BTreeSet<Coord>,
        _timeout: Duration,
    ) -> Result<RawResponse, ProviderError> {
        let coord = legal_moves
            .first()
            .ok_or_else(|| ProviderError::Unavailable("No valid moves available".to_string()))?;

        debug!(party = %self.name, coord = %coord, "First-free provider chose cell");
        Ok(RawResponse::from(format!("{} {}", coord.row(), coord.col())))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
