//! Turn orchestration between two move providers.
//!
//! [`GameOrchestrator`] owns the [`BoardState`] of one game and drives it
//! through an explicit state machine:
//!
//! ```text
//! AwaitingMove(m) ──valid move──▶ Applying(mv) ──▶ TurnComplete(m) ──▶ AwaitingMove(m')
//!       │                              │                 │
//!       └─budget spent / timeout /     └─apply failed    └─win / full board
//!         cancelled ─▶ Aborted              ─▶ Aborted          ─▶ GameOver
//! ```
//!
//! Per-attempt failures (unparseable text, illegal moves, provider errors)
//! are retried inside a turn and never reach the caller. The caller only
//! ever sees one terminal [`GameResult`].

use crate::config::{ConfigError, DuelConfig};
use crate::providers::{MoveProvider, ProviderError, RawResponse, build_provider};
use crate::retry::RetryPolicy;
use duel_tictactoe::{
    Board, BoardState, Coord, IllegalMoveError, Mark, Move, MoveParser, MoveValidator, Outcome,
    ParseError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Why a game stopped without a win or draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum AbortReason {
    /// A party used its whole attempt budget without a legal move.
    #[display("{} made no legal move in {} attempt(s)", mark, attempts)]
    MaxRetriesExceeded {
        /// Party whose turn it was.
        mark: Mark,
        /// Attempts spent.
        attempts: u32,
    },

    /// A turn ran past its deadline.
    #[display("{}'s turn exceeded {:?}", mark, budget)]
    Timeout {
        /// Party whose turn it was.
        mark: Mark,
        /// Deadline that was exceeded.
        budget: Duration,
    },

    /// A validated move was rejected by the board.
    #[display("Internal inconsistency: {}", _0)]
    InternalInconsistency(String),

    /// The game was cancelled from outside.
    #[display("Cancelled")]
    Cancelled,
}

impl std::error::Error for AbortReason {}

/// Terminal value of a game. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum GameResult {
    /// A party completed a line.
    #[display("{} wins", _0)]
    Win(Mark),
    /// Board filled with no line.
    #[display("Draw")]
    Draw,
    /// Game stopped early.
    #[display("Aborted: {}", _0)]
    Aborted(AbortReason),
}

impl From<Outcome> for GameResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(mark) => GameResult::Win(mark),
            Outcome::Draw => GameResult::Draw,
        }
    }
}

/// Why a single attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum AttemptError {
    /// Text was not `"row col"`.
    #[display("Parse error: {}", _0)]
    Parse(ParseError),
    /// Coordinate was not playable.
    #[display("Illegal move: {}", _0)]
    Illegal(IllegalMoveError),
    /// Provider timed out or failed.
    #[display("{}", _0)]
    Provider(ProviderError),
}

impl std::error::Error for AttemptError {}

/// One solicitation-parse-validate cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based attempt number within the turn.
    pub attempt: u32,
    /// Text received, or `None` on timeout or provider failure.
    pub response: Option<RawResponse>,
    /// Accepted coordinate or the reason for rejection.
    pub outcome: Result<Coord, AttemptError>,
}

/// Orchestrator state. `GameOver` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Waiting on the party playing this mark.
    AwaitingMove(Mark),
    /// A validated move is about to be applied.
    Applying(Move),
    /// The party playing this mark has just moved.
    TurnComplete(Mark),
    /// Won or drawn.
    GameOver(GameResult),
    /// Stopped early.
    Aborted(AbortReason),
}

impl OrchestratorState {
    /// True for `GameOver` and `Aborted`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestratorState::GameOver(_) | OrchestratorState::Aborted(_)
        )
    }
}

/// Progress notifications for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// An attempt was rejected; the turn may still be retried.
    AttemptFailed {
        /// Party whose attempt failed.
        mark: Mark,
        /// What happened.
        record: AttemptRecord,
    },
    /// A move was applied to the board.
    MoveApplied(Move),
    /// The game reached its terminal result.
    Finished(GameResult),
}

/// Everything a presentation layer needs to show or replay a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Terminal result.
    pub result: GameResult,
    /// Applied moves in order, each naming its party.
    pub history: Vec<Move>,
    /// Final grid.
    pub board: Board,
    /// Name of the party playing X.
    pub player_x: String,
    /// Name of the party playing O.
    pub player_o: String,
}

impl GameRecord {
    /// Re-applies the history to a fresh board.
    ///
    /// # Errors
    ///
    /// Returns the first [`IllegalMoveError`]; never happens for records
    /// produced by [`GameOrchestrator::run`].
    pub fn replay(&self) -> Result<BoardState, IllegalMoveError> {
        BoardState::replay(&self.history)
    }
}

/// One side of the game: a provider plus its retry budget.
pub struct Party {
    name: String,
    provider: Box<dyn MoveProvider>,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl Party {
    /// Wraps a provider; the party takes the provider's name.
    pub fn new(provider: Box<dyn MoveProvider>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            name: provider.name().to_string(),
            provider,
            retry,
            call_timeout,
        }
    }

    /// Party name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Drives one game from an empty board to a single terminal result.
pub struct GameOrchestrator {
    board: BoardState,
    party_x: Party,
    party_o: Party,
    state: OrchestratorState,
    per_turn_timeout: Option<Duration>,
    debug_mode: bool,
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedSender<GameEvent>>,
}

impl GameOrchestrator {
    /// Creates a game with X to move on an empty board.
    #[instrument(skip_all, fields(player_x = %party_x.name, player_o = %party_o.name))]
    pub fn new(party_x: Party, party_o: Party) -> Self {
        info!("Creating game orchestrator");
        Self {
            board: BoardState::new(),
            party_x,
            party_o,
            state: OrchestratorState::AwaitingMove(Mark::X),
            per_turn_timeout: None,
            debug_mode: false,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Builds both providers and the orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either provider cannot be built.
    #[instrument(skip(config))]
    pub fn from_config(config: &DuelConfig) -> Result<Self, ConfigError> {
        let party = |mark: Mark| -> Result<Party, ConfigError> {
            let party_config = config.party(mark);
            Ok(Party::new(
                build_provider(party_config, mark)?,
                party_config.retry_policy(),
                party_config.call_timeout(),
            ))
        };

        Ok(Self::new(party(Mark::X)?, party(Mark::O)?)
            .with_per_turn_timeout(config.per_turn_timeout())
            .with_debug_mode(*config.debug_mode()))
    }

    /// Caps each turn's wall time. The cap only ever tightens the
    /// budget implied by the parties' retry policies.
    pub fn with_per_turn_timeout(mut self, limit: Option<Duration>) -> Self {
        self.per_turn_timeout = limit;
        self
    }

    /// Logs every attempt at info level instead of debug.
    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Replaces the cancellation token, e.g. with a child of a shutdown token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sends progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Token that aborts the game when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current state.
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Name of the party playing `mark`.
    pub fn party_name(&self, mark: Mark) -> &str {
        self.party(mark).name()
    }

    /// Authoritative board.
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    /// Terminal result, once reached.
    pub fn result(&self) -> Option<GameResult> {
        match &self.state {
            OrchestratorState::GameOver(result) => Some(result.clone()),
            OrchestratorState::Aborted(reason) => Some(GameResult::Aborted(reason.clone())),
            _ => None,
        }
    }

    /// Runs the game to completion and returns its record.
    ///
    /// Calling `run` again on a finished game returns the same record.
    #[instrument(skip(self), fields(player_x = %self.party_x.name, player_o = %self.party_o.name))]
    pub async fn run(&mut self) -> GameRecord {
        info!("Starting game orchestration");
        loop {
            if let Some(result) = self.result() {
                return self.record(result);
            }
            self.step().await;
        }
    }

    /// Performs one state transition. No-op once terminal.
    #[instrument(skip(self), fields(state = ?self.state))]
    pub async fn step(&mut self) -> &OrchestratorState {
        if self.state.is_terminal() {
            return &self.state;
        }

        if self.cancel.is_cancelled() {
            self.transition(OrchestratorState::Aborted(AbortReason::Cancelled));
            return &self.state;
        }

        let next = match self.state.clone() {
            OrchestratorState::AwaitingMove(mark) => match self.solicit(mark).await {
                Ok(action) => OrchestratorState::Applying(action),
                Err(reason) => OrchestratorState::Aborted(reason),
            },
            OrchestratorState::Applying(action) => self.apply(action),
            OrchestratorState::TurnComplete(mark) => match self.board.outcome() {
                Some(outcome) => OrchestratorState::GameOver(outcome.into()),
                None => OrchestratorState::AwaitingMove(mark.opponent()),
            },
            terminal @ (OrchestratorState::GameOver(_) | OrchestratorState::Aborted(_)) => terminal,
        };

        self.transition(next);
        &self.state
    }

    fn transition(&mut self, next: OrchestratorState) {
        if self.state.is_terminal() {
            warn!(state = ?self.state, rejected = ?next, "Ignoring transition out of terminal state");
            return;
        }

        debug!(from = ?self.state, to = ?next, "State transition");
        self.state = next;

        if let Some(result) = self.result() {
            info!(result = %result, moves = self.board.move_count(), "Game finished");
            self.emit(GameEvent::Finished(result));
        }
    }

    fn apply(&mut self, action: Move) -> OrchestratorState {
        let mark = action.mark();
        match self.board.apply(action.clone()) {
            Ok(()) => {
                info!(action = %action, "Move applied");
                self.emit(GameEvent::MoveApplied(action));
                OrchestratorState::TurnComplete(mark)
            }
            Err(e) => {
                error!(action = %action, error = %e, "Validated move rejected by board");
                OrchestratorState::Aborted(AbortReason::InternalInconsistency(e.to_string()))
            }
        }
    }

    /// Deadline for one turn of `mark`.
    fn turn_budget(&self, mark: Mark) -> Duration {
        let party = self.party(mark);
        let budget = party.retry.turn_budget(party.call_timeout);
        match self.per_turn_timeout {
            Some(limit) => budget.min(limit),
            None => budget,
        }
    }

    /// Runs the attempt loop for `mark` under the turn deadline and the
    /// cancellation token. Dropping the loop abandons any in-flight
    /// provider call or retry wait.
    async fn solicit(&mut self, mark: Mark) -> Result<Move, AbortReason> {
        let budget = self.turn_budget(mark);
        let cancel = self.cancel.clone();
        debug!(mark = %mark, budget = ?budget, "Soliciting move");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(mark = %mark, "Game cancelled during turn");
                Err(AbortReason::Cancelled)
            }
            outcome = tokio::time::timeout(budget, self.attempt_loop(mark)) => {
                outcome.unwrap_or_else(|_| {
                    warn!(mark = %mark, budget = ?budget, "Turn deadline exceeded");
                    Err(AbortReason::Timeout { mark, budget })
                })
            }
        }
    }

    async fn attempt_loop(&mut self, mark: Mark) -> Result<Move, AbortReason> {
        let view = self.board.view();
        let legal_moves = self.board.legal_moves();
        let mut attempt = 1;

        loop {
            let party = match mark {
                Mark::X => &mut self.party_x,
                Mark::O => &mut self.party_o,
            };
            let call_timeout = party.call_timeout;
            let retry = party.retry;
            let name = party.name.clone();

            debug!(party = %name, attempt, "Requesting move");
            let response = tokio::time::timeout(
                call_timeout,
                party
                    .provider
                    .request_move(&view, &legal_moves, call_timeout),
            )
            .await
            .unwrap_or(Err(ProviderError::Timeout(call_timeout)));

            let (response, checked) = match response {
                Ok(raw) => {
                    let checked = check_response(&raw, mark, &name, &self.board);
                    (Some(raw), checked)
                }
                Err(e) => (None, Err(AttemptError::from(e))),
            };

            let record = AttemptRecord {
                attempt,
                response,
                outcome: checked.as_ref().map(Move::coord).map_err(|e| e.clone()),
            };
            self.trace_attempt(mark, &name, &record);

            match checked {
                Ok(action) => return Ok(action),
                Err(_) => {
                    self.emit(GameEvent::AttemptFailed { mark, record });

                    if !retry.should_retry(attempt) {
                        warn!(party = %name, attempts = attempt, "Retry budget exhausted");
                        return Err(AbortReason::MaxRetriesExceeded {
                            mark,
                            attempts: attempt,
                        });
                    }

                    retry.wait_before_retry().await;
                    attempt += 1;
                }
            }
        }
    }

    fn trace_attempt(&self, mark: Mark, name: &str, record: &AttemptRecord) {
        let response = record.response.as_ref().map(RawResponse::text);
        match (&record.outcome, self.debug_mode) {
            (Ok(coord), true) => {
                info!(mark = %mark, party = %name, attempt = record.attempt, ?response, coord = %coord, "Attempt accepted")
            }
            (Ok(coord), false) => {
                debug!(mark = %mark, party = %name, attempt = record.attempt, ?response, coord = %coord, "Attempt accepted")
            }
            (Err(e), true) => {
                info!(mark = %mark, party = %name, attempt = record.attempt, ?response, error = %e, "Attempt rejected")
            }
            (Err(e), false) => {
                debug!(mark = %mark, party = %name, attempt = record.attempt, ?response, error = %e, "Attempt rejected")
            }
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("Event receiver dropped");
            }
        }
    }

    fn party(&self, mark: Mark) -> &Party {
        match mark {
            Mark::X => &self.party_x,
            Mark::O => &self.party_o,
        }
    }

    fn record(&self, result: GameResult) -> GameRecord {
        GameRecord {
            result,
            history: self.board.history().to_vec(),
            board: self.board.board().clone(),
            player_x: self.party_x.name.clone(),
            player_o: self.party_o.name.clone(),
        }
    }
}

/// Parses and validates one raw response into a move for `mark`.
fn check_response(
    raw: &RawResponse,
    mark: Mark,
    party: &str,
    board: &BoardState,
) -> Result<Move, AttemptError> {
    let coord = MoveParser::parse(raw.text())?;
    let action = Move::new(coord, mark, party);
    MoveValidator::validate(&action, board)?;
    Ok(action)
}
