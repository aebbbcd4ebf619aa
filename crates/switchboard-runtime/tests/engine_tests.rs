//! Engine Integration Tests
//!
//! Exercises the composition root end to end: loading, ranked search and autocomplete,
//! histories, scoring, blocklist handling, suggestions and snapshots.

use chrono::{NaiveDate, NaiveDateTime};
use std::time::Duration;
use switchboard_core::loader;
use switchboard_runtime::{
    CallOutcome, CallRecord, Contact, Engine, EngineSnapshot, GeneratorError, PhoneNumber,
    SearchField, SwitchboardConfig, SwitchboardError,
};

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn numbers(hits: &[switchboard_runtime::SearchHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.number.as_str()).collect()
}

/// Three contacts sharing the first-name prefix "an"; 003 receives the most traffic
fn ranked_engine() -> Engine {
    let engine = Engine::new(SwitchboardConfig::testing()).unwrap();
    engine
        .load_contacts(vec![
            Contact::new("001", "Ana", "Lee"),
            Contact::new("002", "Anna", "Kim"),
            Contact::new("003", "Andy", "Roe"),
        ])
        .unwrap();
    engine.load_calls(vec![
        CallRecord::new("001", "003", at(1, 9), secs(60)),
        CallRecord::new("002", "003", at(1, 10), secs(60)),
    ]);
    engine
}

// ----------------------------------------------------------------------------
// Scoring
// ----------------------------------------------------------------------------

#[test]
fn test_reference_score() {
    let engine = Engine::new(SwitchboardConfig::testing()).unwrap();
    engine
        .load_contacts(vec![
            Contact::new("001", "Ana", "Lee"),
            Contact::new("002", "Bo", "Kim"),
        ])
        .unwrap();

    engine
        .record_call("001", "002", at(1, 9), secs(60))
        .unwrap();
    engine
        .record_call("002", "001", at(1, 10), secs(30))
        .unwrap();

    assert_eq!(engine.score("001"), 360.0);
    assert_eq!(engine.score("002"), 375.0);
    assert_eq!(engine.score("999"), 0.0);

    let top = engine.top_n(1);
    assert_eq!(top, vec![(PhoneNumber::new("002"), 375.0)]);
}

// ----------------------------------------------------------------------------
// Search
// ----------------------------------------------------------------------------

#[test]
fn test_search_ranks_by_popularity() {
    let engine = ranked_engine();
    let hits = engine.search_by_prefix(SearchField::FirstName, "An", 10);
    assert_eq!(numbers(&hits), vec!["003", "001", "002"]);
    assert_eq!(hits[0].score, 520.0);
    assert_eq!(
        hits[0].contact.as_ref().map(Contact::full_name).as_deref(),
        Some("Andy Roe")
    );
}

#[test]
fn test_search_truncates_before_ranking() {
    let engine = ranked_engine();
    // Search keeps the first candidate found; autocomplete ranks a wider pool
    let searched = engine.search_by_prefix(SearchField::FirstName, "an", 1);
    assert_eq!(numbers(&searched), vec!["001"]);
    let completed = engine.autocomplete(SearchField::FirstName, "an", 1);
    assert_eq!(numbers(&completed), vec!["003"]);
}

#[test]
fn test_search_misses_are_empty() {
    let engine = ranked_engine();
    assert!(engine.search_by_prefix(SearchField::LastName, "zz", 10).is_empty());
    assert!(engine.search_by_prefix(SearchField::Number, "", 10).is_empty());
    assert!(engine.autocomplete(SearchField::Number, "1", 10).is_empty());
    assert_eq!(
        numbers(&engine.search_by_prefix(SearchField::Number, "00", 10)),
        vec!["003", "001", "002"]
    );
}

// ----------------------------------------------------------------------------
// History and Blocklist
// ----------------------------------------------------------------------------

#[test]
fn test_histories() {
    let engine = ranked_engine();
    engine
        .record_call("003", "001", at(1, 8), secs(5))
        .unwrap();

    let history = engine.history_for("003");
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].start_time, at(1, 8));

    let between = engine.history_between("003", "001");
    assert_eq!(between.len(), 2);
    assert_eq!(between[0].caller.as_str(), "003");
    assert!(engine.history_between("001", "002").is_empty());
    assert!(engine.history_for("555").is_empty());
}

#[test]
fn test_blocked_call_is_rejected() {
    let engine = ranked_engine();
    assert_eq!(engine.load_blocked(vec![PhoneNumber::new("002")]), 1);
    assert!(engine.is_blocked("002"));

    let outcome = engine
        .record_call("001", "002", at(2, 9), secs(10))
        .unwrap();
    assert_eq!(outcome, CallOutcome::Blocked);
    assert_eq!(engine.call_count(), 2);

    let outcome = engine
        .record_call("001", "003", at(2, 9), secs(10))
        .unwrap();
    assert!(outcome.is_recorded());
    assert_eq!(engine.call_count(), 3);
}

#[test]
fn test_simulated_calls_respect_blocklist() {
    let engine = ranked_engine();
    engine.load_blocked(loader::parse_blocked("003\n"));

    let text = "001, 002, 03.02.2025 10:00:00, 0:01:00\n\
                002, 003, 03.02.2025 11:00:00, 0:02:00\n\
                003, 001, 03.02.2025 12:00:00, 0:03:00\n";
    let summary = engine.simulate_calls(loader::parse_calls(text, None));
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.rejected, 2);
    assert_eq!(engine.call_count(), 3);

    // History replay ignores the blocklist
    engine.load_calls(loader::parse_calls(text, None));
    assert_eq!(engine.call_count(), 6);
}

// ----------------------------------------------------------------------------
// Suggestions
// ----------------------------------------------------------------------------

#[test]
fn test_suggestions() {
    let engine = ranked_engine();
    let numbers = engine.suggest_numbers("004");
    assert_eq!(numbers.len(), 3);
    assert_eq!(numbers[0].as_str(), "001");

    let names = engine.suggest_names("andy ro");
    assert_eq!(names[0].full_name, "Andy Roe");
    assert_eq!(names[0].number.as_str(), "003");
}

// ----------------------------------------------------------------------------
// Snapshots
// ----------------------------------------------------------------------------

#[test]
fn test_snapshot_round_trip_through_json() {
    let engine = ranked_engine();
    engine.block("002");
    engine
        .record_call("003", "001", at(1, 8), secs(5))
        .unwrap();

    let snapshot = engine.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: EngineSnapshot = serde_json::from_str(&json).unwrap();

    let restored = Engine::new(SwitchboardConfig::testing()).unwrap();
    restored.restore(decoded).unwrap();

    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.contact_count(), 3);
    assert_eq!(restored.call_count(), 3);
    assert!(restored.is_blocked("002"));
    for number in ["001", "002", "003"] {
        assert_eq!(restored.score(number), engine.score(number));
        assert_eq!(restored.history_for(number), engine.history_for(number));
    }
    assert_eq!(restored.top_n(3), engine.top_n(3));
    assert_eq!(
        numbers(&restored.search_by_prefix(SearchField::FirstName, "an", 10)),
        vec!["003", "001", "002"]
    );
}

#[test]
fn test_restore_replaces_existing_state() {
    let engine = ranked_engine();
    let empty = Engine::new(SwitchboardConfig::testing()).unwrap().snapshot();
    engine.restore(empty).unwrap();

    assert_eq!(engine.contact_count(), 0);
    assert_eq!(engine.call_count(), 0);
    assert_eq!(engine.score("003"), 0.0);
    assert!(engine.search_by_prefix(SearchField::FirstName, "an", 10).is_empty());
}

#[test]
fn test_failed_restore_keeps_previous_state() {
    let engine = ranked_engine();
    engine.block("005");
    let before = engine.snapshot();

    let mut bad = EngineSnapshot::default();
    bad.contacts.contacts = vec![
        Contact::new("004", "Dan", "Ode"),
        Contact::new(" ", "No", "Number"),
    ];
    let err = engine.restore(bad).unwrap_err();
    assert!(matches!(err, SwitchboardError::InvalidKey { .. }));

    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.contact_count(), 3);
    assert!(engine.contact("004").is_none());
    assert!(engine.is_blocked("005"));
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn test_restore_refused_while_generating() {
    let mut engine = ranked_engine();
    engine
        .start_traffic(Duration::from_secs(60), 1_000_000)
        .unwrap();

    let err = engine.restore(EngineSnapshot::default()).unwrap_err();
    assert_eq!(
        err,
        SwitchboardError::Generator(GeneratorError::AlreadyRunning)
    );

    engine.shutdown().await.unwrap();
    engine.restore(EngineSnapshot::default()).unwrap();
    assert_eq!(engine.contact_count(), 0);
}
