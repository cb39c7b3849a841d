//! Tests for the game orchestrator driven by scripted providers.

use duel_tictactoe::{Coord, Mark, ParseError};
use llm_duel::{
    AbortReason, AttemptError, GameEvent, GameOrchestrator, GameRecord, GameResult,
    OrchestratorState, Party, ProviderError, RetryPolicy, ScriptStep, ScriptedProvider,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

fn at(row: u8, col: u8) -> Coord {
    Coord::new(row, col).unwrap()
}

fn party(provider: ScriptedProvider, retry: RetryPolicy) -> Party {
    Party::new(Box::new(provider), retry, CALL_TIMEOUT)
}

/// Scripted party with the default 3 attempts and 30s delay.
fn scripted(name: &str, replies: &[&str]) -> Party {
    party(
        ScriptedProvider::replies(name, replies.iter().copied()),
        RetryPolicy::default(),
    )
}

fn counted(name: &str, steps: Vec<ScriptStep>) -> (Party, Arc<AtomicU32>) {
    let provider = ScriptedProvider::new(name, steps);
    let calls = provider.call_counter();
    (party(provider, RetryPolicy::default()), calls)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn coords(record: &GameRecord) -> Vec<(u8, u8)> {
    record
        .history
        .iter()
        .map(|m| (m.coord().row(), m.coord().col()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_immediate_win_for_x() {
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 1", "0 2"]),
        scripted("Bob", &["1 0", "1 1"]),
    );

    let record = game.run().await;

    assert_eq!(record.result, GameResult::Win(Mark::X));
    assert_eq!(record.history.len(), 5);
    assert_eq!(coords(&record), vec![(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
    assert_eq!(
        game.state(),
        &OrchestratorState::GameOver(GameResult::Win(Mark::X))
    );
}

#[tokio::test(start_paused = true)]
async fn test_full_board_with_completed_line_is_a_win() {
    // The ninth move completes the main diagonal: a win, not a draw.
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 2", "1 1", "2 1", "2 2"]),
        scripted("Bob", &["0 1", "1 0", "1 2", "2 0"]),
    );

    let record = game.run().await;

    assert_eq!(record.result, GameResult::Win(Mark::X));
    assert_eq!(record.history.len(), 9);
    assert_eq!(game.board().move_count(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_draw() {
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 2", "1 0", "2 1", "2 2"]),
        scripted("Bob", &["0 1", "1 1", "1 2", "2 0"]),
    );

    let record = game.run().await;

    assert_eq!(record.result, GameResult::Draw);
    assert_eq!(record.history.len(), 9);
    assert!(record.history.iter().all(|m| !m.party().is_empty()));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_reply_is_retried_after_delay() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["9 9", "1 1"]),
        scripted("Bob", &[]),
    )
    .with_events(tx);

    let start = tokio::time::Instant::now();
    assert!(matches!(game.step().await, OrchestratorState::Applying(_)));
    assert!(start.elapsed() >= Duration::from_secs(30));

    game.step().await;
    assert_eq!(game.board().move_count(), 1);
    assert_eq!(game.board().history()[0].coord(), at(1, 1));
    assert_eq!(game.board().history()[0].party(), "Alice");

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    match &events[0] {
        GameEvent::AttemptFailed { mark, record } => {
            assert_eq!(*mark, Mark::X);
            assert_eq!(record.attempt, 1);
            assert_eq!(record.response.as_ref().map(|r| r.text()), Some("9 9"));
            assert_eq!(
                record.outcome,
                Err(AttemptError::Parse(ParseError::OutOfRange(9)))
            );
        }
        other => panic!("Expected AttemptFailed, got {:?}", other),
    }
    assert!(matches!(&events[1], GameEvent::MoveApplied(m) if m.coord() == at(1, 1)));
}

#[tokio::test(start_paused = true)]
async fn test_occupied_cell_is_retried() {
    let (o, calls) = counted(
        "Bob",
        vec![ScriptStep::reply("1 1"), ScriptStep::reply("0 0")],
    );
    let mut game = GameOrchestrator::new(scripted("Alice", &["1 1"]), o);

    for _ in 0..5 {
        game.step().await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(game.board().move_count(), 2);
    assert_eq!(game.board().history()[1].coord(), at(0, 0));
    assert_eq!(game.board().history()[1].mark(), Mark::O);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_replies_exhaust_retries() {
    let (x, calls) = counted(
        "Alice",
        vec![
            ScriptStep::reply("center"),
            ScriptStep::reply("1,1"),
            ScriptStep::reply("I pick the middle"),
        ],
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = GameOrchestrator::new(x, scripted("Bob", &[])).with_events(tx);

    let record = game.run().await;

    assert_eq!(
        record.result,
        GameResult::Aborted(AbortReason::MaxRetriesExceeded {
            mark: Mark::X,
            attempts: 3,
        })
    );
    assert!(record.history.is_empty());
    assert_eq!(game.board().move_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let events = drain(&mut rx);
    let failures = events
        .iter()
        .filter(|e| matches!(e, GameEvent::AttemptFailed { .. }))
        .count();
    assert_eq!(failures, 3);
    assert_eq!(
        events.last(),
        Some(&GameEvent::Finished(record.result.clone()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_provider_failure_is_retried() {
    let (x, calls) = counted(
        "Alice",
        vec![
            ScriptStep::Fail("rate limited".to_string()),
            ScriptStep::reply("0 0"),
            ScriptStep::reply("0 1"),
            ScriptStep::reply("0 2"),
        ],
    );
    let mut game = GameOrchestrator::new(x, scripted("Bob", &["1 0", "1 1"]));

    let record = game.run().await;

    assert_eq!(record.result, GameResult::Win(Mark::X));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_hung_call_times_out_and_is_retried() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let x = party(
        ScriptedProvider::new("Alice", vec![ScriptStep::Hang, ScriptStep::reply("2 2")]),
        RetryPolicy::new(3, Duration::from_secs(1)),
    );
    let mut game = GameOrchestrator::new(x, scripted("Bob", &[])).with_events(tx);

    game.step().await;
    game.step().await;

    assert_eq!(game.board().history()[0].coord(), at(2, 2));
    match &drain(&mut rx)[0] {
        GameEvent::AttemptFailed { record, .. } => {
            assert_eq!(record.response, None);
            assert_eq!(
                record.outcome,
                Err(AttemptError::Provider(ProviderError::Timeout(CALL_TIMEOUT)))
            );
        }
        other => panic!("Expected AttemptFailed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hang_on_every_attempt_spends_retry_budget() {
    let (x, calls) = counted(
        "Alice",
        vec![ScriptStep::Hang, ScriptStep::Hang, ScriptStep::Hang],
    );
    let mut game = GameOrchestrator::new(x, scripted("Bob", &[]));

    let start = tokio::time::Instant::now();
    let record = game.run().await;

    // Three 5s calls and two 30s waits end exactly on the turn deadline;
    // the attempt loop finishes first, so the budget, not the clock, is reported.
    assert_eq!(
        record.result,
        GameResult::Aborted(AbortReason::MaxRetriesExceeded {
            mark: Mark::X,
            attempts: 3,
        })
    );
    assert!(start.elapsed() >= Duration::from_secs(75));
    assert!(start.elapsed() < Duration::from_secs(76));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(record.history.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_off_board_record_fails_to_decode() {
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 1", "0 2"]),
        scripted("Bob", &["1 0", "1 1"]),
    );
    let json = serde_json::to_string(&game.run().await).unwrap();
    assert!(json.contains(r#"{"row":0,"col":0}"#));

    let tampered = json.replace(r#"{"row":0,"col":0}"#, r#"{"row":5,"col":5}"#);
    let err = serde_json::from_str::<GameRecord>(&tampered).unwrap_err();
    assert!(err.to_string().contains("off the board"));
}

#[tokio::test(start_paused = true)]
async fn test_turn_deadline_aborts_game() {
    let x = party(
        ScriptedProvider::new("Alice", vec![ScriptStep::Hang, ScriptStep::Hang]),
        RetryPolicy::new(3, Duration::ZERO),
    );
    let mut game = GameOrchestrator::new(x, scripted("Bob", &[]))
        .with_per_turn_timeout(Some(Duration::from_secs(7)));

    let start = tokio::time::Instant::now();
    let record = game.run().await;

    assert_eq!(
        record.result,
        GameResult::Aborted(AbortReason::Timeout {
            mark: Mark::X,
            budget: Duration::from_secs(7),
        })
    );
    assert!(record.history.is_empty());
    assert!(start.elapsed() >= Duration::from_secs(7));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_pending_turn() {
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["1 1"]),
        party(
            ScriptedProvider::new("Bob", vec![ScriptStep::Hang]),
            RetryPolicy::default(),
        ),
    );
    let token = game.cancellation_token();

    let handle = tokio::spawn(async move { game.run().await });
    tokio::time::sleep(Duration::from_secs(1)).await;
    token.cancel();

    let record = handle.await.unwrap();
    assert_eq!(record.result, GameResult::Aborted(AbortReason::Cancelled));
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.history[0].mark(), Mark::X);
}

#[tokio::test(start_paused = true)]
async fn test_result_is_produced_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 1", "0 2"]),
        scripted("Bob", &["1 0", "1 1"]),
    )
    .with_events(tx);

    let first = game.run().await;
    let second = game.run().await;
    assert_eq!(first, second);
    assert!(game.step().await.is_terminal());

    let events = drain(&mut rx);
    let finished = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Finished(_)))
        .count();
    let applied = events
        .iter()
        .filter(|e| matches!(e, GameEvent::MoveApplied(_)))
        .count();
    assert_eq!(finished, 1);
    assert_eq!(applied, first.history.len());
}

#[tokio::test(start_paused = true)]
async fn test_record_replays_and_serializes() {
    let mut game = GameOrchestrator::new(
        scripted("Alice", &["0 0", "0 2", "1 0", "2 1", "2 2"]),
        scripted("Bob", &["0 1", "1 1", "1 2", "2 0"]),
    );
    let record = game.run().await;

    let replayed = record.replay().unwrap();
    assert_eq!(replayed.board(), &record.board);
    assert_eq!(replayed.outcome().map(GameResult::from), Some(GameResult::Draw));

    let json = serde_json::to_string(&record).unwrap();
    let decoded: GameRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, record);
    assert_eq!(decoded.player_x, "Alice");
    assert_eq!(decoded.history[1].party(), "Bob");
}
