//! Provider that replays a fixed script of responses.

use super::{MoveProvider, ProviderError, RawResponse};
use duel_tictactoe::{BoardView, Coord};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// One scripted reaction to a move request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Return this text.
    Reply(String),
    /// Fail with [`ProviderError::Unavailable`].
    Fail(String),
    /// Never answer.
    Hang,
}

impl ScriptStep {
    /// Shorthand for [`ScriptStep::Reply`].
    pub fn reply(text: impl Into<String>) -> Self {
        ScriptStep::Reply(text.into())
    }
}

/// Answers move requests from a queue of [`ScriptStep`]s.
///
/// Once the script runs out every request fails.
pub struct ScriptedProvider {
    name: String,
    steps: VecDeque<ScriptStep>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProvider {
    /// Creates a provider that plays `steps` in order.
    pub fn new(name: impl Into<String>, steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into_iter().collect(),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Creates a provider that replies with each text in order.
    pub fn replies<'a>(name: impl Into<String>, texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(name, texts.into_iter().map(ScriptStep::reply))
    }

    /// Shared counter of requests received, readable after the provider
    /// has been moved into an orchestrator.
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl MoveProvider for ScriptedProvider {
    async fn request_move(
        &mut self,
        _view: &BoardView,
        _legal_moves: &BTreeSet<Coord>,
        _timeout: Duration,
    ) -> Result<RawResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let step = self.steps.pop_front();
        debug!(party = %self.name, call, step = ?step, "Scripted provider answering");

        match step {
            Some(ScriptStep::Reply(text)) => Ok(RawResponse::from(text)),
            Some(ScriptStep::Fail(reason)) => Err(ProviderError::Unavailable(reason)),
            Some(ScriptStep::Hang) => std::future::pending().await,
            None => Err(ProviderError::Unavailable("Script exhausted".to_string())),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
