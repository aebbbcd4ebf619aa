//! Traffic Generator Lifecycle Tests
//!
//! Drives the background generator through the engine: natural termination, pause and
//! resume, bounded stop, state-machine errors and blocklist accounting.

use std::time::Duration;
use switchboard_runtime::{
    Contact, Engine, GeneratorError, GeneratorState, SwitchboardConfig, SwitchboardError,
};
use switchboard_core::TrafficConfig;
use tokio::time::{sleep, timeout};

// ----------------------------------------------------------------------------
// Test Utilities
// ----------------------------------------------------------------------------

/// Generator that never sleeps between calls
fn unthrottled_config() -> SwitchboardConfig {
    SwitchboardConfig::testing().with_traffic(TrafficConfig {
        throttle_factor: 0.0,
        ..TrafficConfig::testing()
    })
}

fn engine_with(config: SwitchboardConfig, numbers: &[&str]) -> Engine {
    let engine = Engine::new(config).unwrap();
    engine
        .load_contacts(
            numbers
                .iter()
                .enumerate()
                .map(|(i, number)| Contact::new(*number, format!("First{i}"), format!("Last{i}"))),
        )
        .unwrap();
    engine
}

fn generator_error(err: SwitchboardError) -> GeneratorError {
    match err {
        SwitchboardError::Generator(e) => e,
        other => panic!("expected generator error, got {other:?}"),
    }
}

async fn wait_for_completion(engine: &mut Engine) {
    timeout(Duration::from_secs(5), engine.wait_traffic())
        .await
        .expect("generator should finish on its own");
}

// ----------------------------------------------------------------------------
// Termination
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_zero_target_generates_nothing() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002", "003"]);
    engine.start_traffic(Duration::from_secs(10), 0).unwrap();
    wait_for_completion(&mut engine).await;

    assert_eq!(engine.traffic_stats().generated, 0);
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn test_zero_duration_generates_nothing() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002"]);
    engine.start_traffic(Duration::ZERO, 100).unwrap();
    wait_for_completion(&mut engine).await;

    assert_eq!(engine.traffic_stats().generated, 0);
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);
}

#[tokio::test]
async fn test_run_stops_at_target_count() {
    let mut engine = engine_with(unthrottled_config(), &["001", "002", "003", "004"]);
    engine.start_traffic(Duration::from_secs(30), 50).unwrap();
    wait_for_completion(&mut engine).await;

    let stats = engine.traffic_stats();
    assert_eq!(stats.generated, 50);
    assert_eq!(stats.accepted, 50);
    assert_eq!(stats.blocked, 0);
    assert_eq!(engine.call_count(), 50);
    assert!(stats.total_duration_secs >= 50);

    let report = engine.traffic_report();
    assert_eq!(report.generated, 50);
    assert!(report.average_duration_secs >= 1.0);
    assert_eq!(report.top.len(), 4);
    assert_eq!(report.top[0].1, engine.score(&report.top[0].0));
}

#[tokio::test]
async fn test_blocked_numbers_are_never_recorded() {
    let mut engine = engine_with(unthrottled_config(), &["001", "002"]);
    engine.block("002");
    engine.start_traffic(Duration::from_secs(30), 20).unwrap();
    wait_for_completion(&mut engine).await;

    let stats = engine.traffic_stats();
    assert_eq!(stats.generated, 20);
    assert_eq!(stats.blocked, 20);
    assert_eq!(stats.accepted, 0);
    assert_eq!(engine.call_count(), 0);
    assert_eq!(engine.traffic_report().average_duration_secs, 0.0);
}

// ----------------------------------------------------------------------------
// Control
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_pause_halts_generation_until_resume() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002", "003"]);
    engine
        .start_traffic(Duration::from_secs(60), 1_000_000)
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    engine.pause_traffic().unwrap();
    assert_eq!(engine.traffic_state(), GeneratorState::Paused);
    // Let any call already in flight land
    sleep(Duration::from_millis(50)).await;
    let paused_at = engine.traffic_stats().generated;

    sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.traffic_stats().generated, paused_at);
    assert!(engine.traffic_state().is_active());

    engine.resume_traffic().unwrap();
    assert_eq!(engine.traffic_state(), GeneratorState::Running);
    sleep(Duration::from_millis(100)).await;
    assert!(engine.traffic_stats().generated > paused_at);

    let stats = engine.stop_traffic().await.unwrap();
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.traffic_stats(), stats);
}

#[tokio::test]
async fn test_stop_while_paused() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002"]);
    engine
        .start_traffic(Duration::from_secs(60), 1_000_000)
        .unwrap();
    engine.pause_traffic().unwrap();

    engine.stop_traffic().await.unwrap();
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);
    assert!(!engine.traffic_state().is_active());
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002"]);
    engine
        .start_traffic(Duration::from_secs(60), 1_000_000)
        .unwrap();

    let err = engine
        .start_traffic(Duration::from_secs(60), 10)
        .unwrap_err();
    assert_eq!(generator_error(err), GeneratorError::AlreadyRunning);

    engine.stop_traffic().await.unwrap();
}

#[tokio::test]
async fn test_control_without_run_is_rejected() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002"]);
    assert_eq!(engine.traffic_state(), GeneratorState::Idle);
    assert_eq!(
        generator_error(engine.pause_traffic().unwrap_err()),
        GeneratorError::NotActive
    );
    assert_eq!(
        generator_error(engine.resume_traffic().unwrap_err()),
        GeneratorError::NotActive
    );
    assert_eq!(
        generator_error(engine.stop_traffic().await.unwrap_err()),
        GeneratorError::NotActive
    );
    // Shutdown tolerates an idle generator
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_single_contact_is_insufficient() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001"]);
    let err = engine
        .start_traffic(Duration::from_secs(1), 10)
        .unwrap_err();
    assert_eq!(
        generator_error(err),
        GeneratorError::InsufficientIdentifiers { available: 1 }
    );
    assert_eq!(engine.traffic_state(), GeneratorState::Idle);
}

#[tokio::test]
async fn test_restart_after_natural_finish() {
    let mut engine = engine_with(unthrottled_config(), &["001", "002", "003"]);
    engine.start_traffic(Duration::from_secs(30), 10).unwrap();
    wait_for_completion(&mut engine).await;
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);

    engine.start_traffic(Duration::from_secs(30), 5).unwrap();
    wait_for_completion(&mut engine).await;

    // Counters restart, the log keeps growing
    assert_eq!(engine.traffic_stats().generated, 5);
    assert_eq!(engine.call_count(), 15);
}

#[tokio::test]
async fn test_queries_run_alongside_generator() {
    let mut engine = engine_with(SwitchboardConfig::testing(), &["001", "002", "003"]);
    engine
        .start_traffic(Duration::from_secs(60), 1_000_000)
        .unwrap();

    for _ in 0..10 {
        sleep(Duration::from_millis(5)).await;
        let history = engine.history_for("001");
        assert!(history.windows(2).all(|w| w[0].start_time <= w[1].start_time));
        let _ = engine.top_n(3);
    }

    engine.shutdown().await.unwrap();
    assert_eq!(engine.traffic_state(), GeneratorState::Stopped);
}
