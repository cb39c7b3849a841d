//! Concurrent execution of independent games.

use crate::orchestrator::{AbortReason, GameOrchestrator, GameRecord, GameResult};
use duel_tictactoe::{Board, Mark};
use futures::future::join_all;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Runs every game on its own task and returns their records in input order.
///
/// Each game gets a child of `shutdown`: cancelling `shutdown` aborts all
/// unfinished games, while a game's own token only aborts that game.
#[instrument(skip_all, fields(games = games.len()))]
pub async fn run_batch(
    games: Vec<GameOrchestrator>,
    shutdown: CancellationToken,
) -> Vec<GameRecord> {
    info!("Starting batch");

    let mut players = Vec::with_capacity(games.len());
    let mut handles = Vec::with_capacity(games.len());
    for game in games {
        let mut game = game.with_cancellation(shutdown.child_token());
        players.push((
            game.party_name(Mark::X).to_string(),
            game.party_name(Mark::O).to_string(),
        ));
        handles.push(tokio::spawn(async move { game.run().await }));
    }

    let records = join_all(handles)
        .await
        .into_iter()
        .zip(players)
        .enumerate()
        .map(|(index, (joined, (player_x, player_o)))| {
            joined.unwrap_or_else(|e| {
                error!(game = index, error = %e, "Game task failed");
                GameRecord {
                    result: GameResult::Aborted(AbortReason::InternalInconsistency(format!(
                        "Game task failed: {}",
                        e
                    ))),
                    history: Vec::new(),
                    board: Board::new(),
                    player_x,
                    player_o,
                }
            })
        })
        .collect::<Vec<_>>();

    info!(summary = ?summarize(&records), "Batch finished");
    records
}

/// Tallies results as `X wins`, `O wins`, `Draw` and `Aborted`.
pub fn summarize(records: &[GameRecord]) -> BTreeMap<String, usize> {
    records.iter().fold(BTreeMap::new(), |mut counts, record| {
        let key = match &record.result {
            GameResult::Aborted(_) => "Aborted".to_string(),
            other => other.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
        counts
    })
}
