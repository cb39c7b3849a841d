//! LLM Duel - turn orchestration for model-vs-model tic-tac-toe
//!
//! Two untrusted move providers take turns on a shared board. Every
//! response is parsed and validated before it touches the board; bad
//! responses are retried on a fixed schedule and a turn that cannot
//! produce a legal move ends the game with an explicit abort.
//!
//! # Architecture
//!
//! - **Orchestrator**: state machine that owns the board and runs one game
//! - **Providers**: LLM-backed, scripted and first-free move sources
//! - **Retry**: per-party attempt budget and delay
//! - **Batch**: many independent games under one shutdown token
//!
//! # Example
//!
//! ```
//! use llm_duel::{GameOrchestrator, GameResult, Party, RetryPolicy, ScriptedProvider};
//! use duel_tictactoe::Mark;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let party = |name: &str, replies: &[&'static str]| {
//!     Party::new(
//!         Box::new(ScriptedProvider::replies(name, replies.iter().copied())),
//!         RetryPolicy::new(3, Duration::ZERO),
//!         Duration::from_secs(5),
//!     )
//! };
//!
//! let mut game = GameOrchestrator::new(
//!     party("Alice", &["0 0", "0 1", "0 2"]),
//!     party("Bob", &["1 0", "1 1"]),
//! );
//! let record = game.run().await;
//! assert_eq!(record.result, GameResult::Win(Mark::X));
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod batch;
mod config;
mod llm_client;
mod orchestrator;
mod providers;
mod retry;

pub mod cli;

// Crate-level exports - Configuration
pub use config::{ConfigError, DuelConfig, ModelSpec, PartyConfig};

// Crate-level exports - LLM client
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider};

// Crate-level exports - Orchestration
pub use orchestrator::{
    AbortReason, AttemptError, AttemptRecord, GameEvent, GameOrchestrator, GameRecord, GameResult,
    OrchestratorState, Party,
};

// Crate-level exports - Providers
pub use providers::{
    FirstFreeProvider, LlmMoveProvider, MoveProvider, ProviderError, RawResponse, ScriptStep,
    ScriptedProvider, build_provider, default_description, render_turn_prompt,
};

// Crate-level exports - Retry and batch
pub use batch::{run_batch, summarize};
pub use retry::RetryPolicy;
