//! LLM Duel - command-line referee
//!
//! Loads a match configuration, builds both parties and runs games until
//! they finish or Ctrl-C cancels them.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use llm_duel::cli::{Cli, Command};
use llm_duel::{DuelConfig, GameEvent, GameOrchestrator, run_batch, summarize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (API keys)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(debug) = cli.debug {
        config = config.with_debug_mode(debug);
    }

    initialize_tracing(*config.debug_mode());
    if !cli.config.exists() {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    let shutdown = CancellationToken::new();
    spawn_ctrl_c_listener(shutdown.clone());

    match cli.command {
        Command::Play { json } => run_play(&config, shutdown, json).await,
        Command::Batch { games } => run_games(&config, shutdown, games).await,
    }
}

/// Loads the match configuration, falling back to defaults when the file
/// does not exist.
fn load_config(path: &std::path::Path) -> Result<DuelConfig> {
    if path.exists() {
        Ok(DuelConfig::from_file(path)?)
    } else {
        Ok(DuelConfig::default())
    }
}

fn initialize_tracing(debug_mode: bool) {
    let default_filter = if debug_mode {
        "info,llm_duel=debug,duel_tictactoe=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(debug_mode, "Tracing initialized");
}

fn spawn_ctrl_c_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Ctrl-C received, cancelling games"),
                    Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, cancelling games"),
                }
                shutdown.cancel();
            }
        }
    });
}

/// Plays one game, printing moves as they land.
#[instrument(skip(config, shutdown))]
async fn run_play(config: &DuelConfig, shutdown: CancellationToken, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = GameOrchestrator::from_config(config)?
        .with_cancellation(shutdown.child_token())
        .with_events(tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                GameEvent::MoveApplied(action) if !json => println!("{}", action),
                GameEvent::AttemptFailed { mark, record } if !json => {
                    if let Err(e) = &record.outcome {
                        println!("  {} attempt {} rejected: {}", mark, record.attempt, e);
                    }
                }
                _ => {}
            }
        }
    });

    let record = game.run().await;
    // Dropping the game closes the event channel so the printer can finish.
    drop(game);
    printer.await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("\n{}\n", record.board.display());
        println!(
            "{} (X: {}, O: {})",
            record.result, record.player_x, record.player_o
        );
    }
    Ok(())
}

/// Plays `games` independent games concurrently and prints a summary.
#[instrument(skip(config, shutdown))]
async fn run_games(config: &DuelConfig, shutdown: CancellationToken, games: usize) -> Result<()> {
    let orchestrators = (0..games)
        .map(|_| GameOrchestrator::from_config(config))
        .collect::<Result<Vec<_>, _>>()?;

    let records = run_batch(orchestrators, shutdown).await;
    for (index, record) in records.iter().enumerate() {
        println!(
            "Game {}: {} ({} moves, X: {}, O: {})",
            index + 1,
            record.result,
            record.history.len(),
            record.player_x,
            record.player_o,
        );
    }

    for (result, count) in summarize(&records) {
        println!("{}: {}", result, count);
    }
    Ok(())
}
