//! Event log and deterministic replay validation
//!
//! Every event the scheduler applies is logged with its event-time. Feeding
//! the log into a fresh engine must reproduce the same final book; the
//! comparison catches any hidden nondeterminism in the matching path.

use lob::engine::MatchEngine;
use serde::{Deserialize, Serialize};
use types::event::Event;
use types::numeric::{Price, Qty};
use types::order::Side;

/// One applied event with its event-time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub time: u64,
    pub event: Event,
}

/// Book state fingerprint for replay comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub best_bid: Option<(Price, Qty)>,
    pub best_ask: Option<(Price, Qty)>,
    pub bid_depth: Qty,
    pub ask_depth: Qty,
    pub order_count: usize,
    pub trades: u64,
}

/// Capture a fingerprint of the engine plus the observed trade count
pub fn capture(engine: &MatchEngine, trades: u64) -> EngineSnapshot {
    EngineSnapshot {
        best_bid: engine.book().best_bid(),
        best_ask: engine.book().best_ask(),
        bid_depth: engine.book().side_depth(Side::Bid),
        ask_depth: engine.book().side_depth(Side::Ask),
        order_count: engine.book().order_count(),
        trades,
    }
}

/// Replay a log into a fresh engine and fingerprint the result
pub fn replay(initial_mid: Price, log: &[LoggedEvent]) -> EngineSnapshot {
    let mut engine = MatchEngine::new(initial_mid);
    let mut trades = 0u64;
    for entry in log {
        let result = engine.apply(&entry.event, entry.time);
        trades += result.trades().len() as u64;
    }
    capture(&engine, trades)
}

/// Result of replay validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayValidation {
    pub matches: bool,
    pub original: EngineSnapshot,
    pub replayed: EngineSnapshot,
}

/// Replay a log and compare against the fingerprint of the original run
pub fn validate_replay(
    initial_mid: Price,
    log: &[LoggedEvent],
    expected: &EngineSnapshot,
) -> ReplayValidation {
    let replayed = replay(initial_mid, log);
    ReplayValidation {
        matches: replayed == *expected,
        original: expected.clone(),
        replayed,
    }
}

/// Serialize an event log as JSON
pub fn export_event_log(log: &[LoggedEvent]) -> String {
    serde_json::to_string_pretty(log).unwrap_or_default()
}

/// Parse an event log from JSON
pub fn import_event_log(json: &str) -> Result<Vec<LoggedEvent>, serde_json::Error> {
    serde_json::from_str(json)
}
