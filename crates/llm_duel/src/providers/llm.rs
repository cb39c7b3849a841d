//! LLM-backed move provider.

use super::{MoveProvider, ProviderError, RawResponse};
use crate::llm_client::LlmClient;
use duel_tictactoe::{BoardView, Coord, Mark};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default system prompt for the party playing `mark`.
#[instrument]
pub fn default_description(mark: Mark) -> String {
    format!(
        "You are Player {mark} in a game of Tic Tac Toe. You win by placing three {mark}'s \
in a row: horizontally, vertically or diagonally.

BOARD:
- A 3x3 grid addressed as (row, column), each from 0 to 2
- (0, 0) is the top-left corner and (2, 2) the bottom-right
- Empty cells are shown as a blank

RULES:
- Place {mark} only on an empty cell
- Players alternate turns
- Three marks in a line wins; a full board with no line is a draw

REPLY FORMAT:
- Reply with ONLY two numbers separated by a space: row then column
- For example \"1 2\" places {mark} in row 1, column 2
- Choose only from the valid moves you are given; any other text is rejected

STRATEGY:
- Block your opponent's immediate wins
- Prefer moves that open more than one winning line"
    )
}

/// Renders the per-turn user message: board, side and valid moves.
pub fn render_turn_prompt(view: &BoardView, legal_moves: &BTreeSet<Coord>, mark: Mark) -> String {
    let moves = legal_moves
        .iter()
        .map(|c| format!("{} {}", c.row(), c.col()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are playing {mark}. It is {turn}'s turn.\n\n\
Current board:\n{board}\n\n\
Valid moves (row column): {moves}\n\n\
Reply with your move as two numbers, nothing else.",
        turn = view.turn(),
        board = view.board().display(),
    )
}

/// Party whose moves come from a chat model.
pub struct LlmMoveProvider {
    name: String,
    mark: Mark,
    system_prompt: String,
    client: LlmClient,
}

impl LlmMoveProvider {
    /// Creates a provider that plays `mark` with the given system prompt.
    #[instrument(skip(system_prompt, client), fields(model = %client.config().model()))]
    pub fn new(name: String, mark: Mark, system_prompt: String, client: LlmClient) -> Self {
        info!(party = %name, "Creating LLM move provider");
        Self {
            name,
            mark,
            system_prompt,
            client,
        }
    }
}

#[async_trait::async_trait]
impl MoveProvider for LlmMoveProvider {
    async fn request_move(
        &mut self,
        view: &BoardView,
        legal_moves: &BTreeSet<Coord>,
        timeout: Duration,
    ) -> Result<RawResponse, ProviderError> {
        let prompt = render_turn_prompt(view, legal_moves, self.mark);
        debug!(party = %self.name, prompt_length = prompt.len(), "Requesting move from LLM");

        match self
            .client
            .generate(&self.system_prompt, &prompt, timeout)
            .await
        {
            Ok(text) => {
                debug!(party = %self.name, response = %text, "LLM responded");
                Ok(RawResponse::from(text))
            }
            Err(e) if e.timed_out => {
                warn!(party = %self.name, "LLM request timed out");
                Err(ProviderError::Timeout(timeout))
            }
            Err(e) => {
                warn!(party = %self.name, error = %e, "LLM request failed");
                Err(ProviderError::Unavailable(e.message))
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
