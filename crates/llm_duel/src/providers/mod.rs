//! Move providers: the external decision sources behind each party.

mod first_free;
mod llm;
mod scripted;

pub use first_free::FirstFreeProvider;
pub use llm::{LlmMoveProvider, default_description, render_turn_prompt};
pub use scripted::{ScriptStep, ScriptedProvider};

use crate::config::{ConfigError, ModelSpec, PartyConfig};
use crate::llm_client::{LlmClient, LlmConfig};
use duel_tictactoe::{BoardView, Coord, Mark};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, instrument};

/// Unparsed text returned by a provider for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub struct RawResponse(String);

impl RawResponse {
    /// The text as received.
    pub fn text(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// Why a provider produced no text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProviderError {
    /// No response within the call timeout.
    #[display("Provider did not respond within {:?}", _0)]
    Timeout(Duration),

    /// The provider failed outright (transport, API or script error).
    #[display("Provider unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for ProviderError {}

/// A source of moves for one party.
///
/// Implementations are untrusted: the text they return is parsed and
/// validated before it touches the board, and they may be slow or fail.
#[async_trait::async_trait]
pub trait MoveProvider: Send + Sync {
    /// Asks for a move on `view`, choosing from `legal_moves`.
    ///
    /// `timeout` is the budget for this call; the orchestrator enforces it
    /// regardless, so honouring it is a courtesy that yields better errors.
    async fn request_move(
        &mut self,
        view: &BoardView,
        legal_moves: &BTreeSet<Coord>,
        timeout: Duration,
    ) -> Result<RawResponse, ProviderError>;

    /// Returns the provider's display name.
    fn name(&self) -> &str;
}

/// Builds the provider described by a party's configuration.
///
/// LLM providers read their API key from the environment variable named by
/// [`LlmProvider::api_key_var`](crate::LlmProvider::api_key_var).
///
/// # Errors
///
/// Returns [`ConfigError`] for an unsupported provider prefix or a missing
/// API key.
#[instrument(skip(party), fields(party = %party.name(), model = %party.model()))]
pub fn build_provider(party: &PartyConfig, mark: Mark) -> Result<Box<dyn MoveProvider>, ConfigError> {
    match party.model_spec()? {
        ModelSpec::Local => {
            debug!("Using local first-free provider");
            Ok(Box::new(FirstFreeProvider::new(party.name().clone())))
        }
        ModelSpec::Llm { provider, model } => {
            let api_key = std::env::var(provider.api_key_var()).map_err(|_| {
                ConfigError::new(format!(
                    "{} environment variable not set",
                    provider.api_key_var()
                ))
            })?;
            let config = LlmConfig::new(provider, api_key, model, *party.max_tokens());
            Ok(Box::new(LlmMoveProvider::new(
                party.name().clone(),
                mark,
                party.system_prompt(mark),
                LlmClient::new(config),
            )))
        }
    }
}
