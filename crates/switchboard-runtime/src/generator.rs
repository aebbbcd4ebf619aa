//! Synthetic Traffic Generator
//!
//! Runs a background tokio task that invents calls between known numbers and feeds them
//! into the shared call log, while foreground queries keep reading the same structures.
//! The task is steered through a `watch` channel carrying the generator state:
//! - `Running`: generate, then sleep for the throttle interval
//! - `Paused`: poll on the configured interval without generating or spending run time
//! - `Stopped`: exit at the next check
//!
//! `stop` waits for the task with a bounded join. A task that does not exit in time is
//! reported as `JoinTimeout` and its handle is kept so a later `stop` can retry.

use crate::shared::{lock, read, write, Shared};
use chrono::Local;
use core::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};
use switchboard_core::{Blocklist, CallLog, GeneratorError, PhoneNumber, TrafficConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

// ----------------------------------------------------------------------------
// State and Counters
// ----------------------------------------------------------------------------

/// Lifecycle of the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl GeneratorState {
    /// Running or paused
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Live counters of the current or last run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    /// Calls attempted, accepted or blocked
    pub generated: u64,
    pub accepted: u64,
    pub blocked: u64,
    /// Sum of accepted call durations
    pub total_duration_secs: u64,
}

impl TrafficStats {
    pub fn average_duration_secs(&self) -> f64 {
        if self.accepted == 0 {
            0.0
        } else {
            self.total_duration_secs as f64 / self.accepted as f64
        }
    }
}

/// Read-only summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    pub generated: u64,
    pub accepted: u64,
    pub blocked: u64,
    pub average_duration_secs: f64,
    /// Most popular numbers at the time of the report
    pub top: Vec<(PhoneNumber, f64)>,
}

// ----------------------------------------------------------------------------
// Traffic Generator
// ----------------------------------------------------------------------------

/// Controller for the background traffic task
pub struct TrafficGenerator {
    config: TrafficConfig,
    call_log: Shared<CallLog>,
    blocklist: Shared<Blocklist>,
    stats: Arc<Mutex<TrafficStats>>,
    control: Arc<watch::Sender<GeneratorState>>,
    handle: Option<JoinHandle<()>>,
}

impl TrafficGenerator {
    pub fn new(
        config: TrafficConfig,
        call_log: Arc<RwLock<CallLog>>,
        blocklist: Arc<RwLock<Blocklist>>,
    ) -> Self {
        let (control, _) = watch::channel(GeneratorState::Idle);
        Self {
            config,
            call_log,
            blocklist,
            stats: Arc::new(Mutex::new(TrafficStats::default())),
            control: Arc::new(control),
            handle: None,
        }
    }

    /// Start a run over `identifiers` lasting at most `duration` or `target_count` calls
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &mut self,
        identifiers: Vec<PhoneNumber>,
        duration: Duration,
        target_count: u64,
    ) -> Result<(), GeneratorError> {
        if self.is_active() || self.handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(GeneratorError::AlreadyRunning);
        }
        if identifiers.len() < 2 {
            return Err(GeneratorError::InsufficientIdentifiers {
                available: identifiers.len(),
            });
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| GeneratorError::NoRuntime)?;

        *lock(&self.stats) = TrafficStats::default();
        self.control.send_replace(GeneratorState::Running);

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let worker = TrafficWorker {
            identifiers,
            duration,
            target_count,
            config: self.config.clone(),
            call_log: Arc::clone(&self.call_log),
            blocklist: Arc::clone(&self.blocklist),
            stats: Arc::clone(&self.stats),
            control: self.control.subscribe(),
            state: Arc::clone(&self.control),
            rng,
        };

        info!(
            "Starting traffic generator: {} numbers, {:?}, target {} calls",
            worker.identifiers.len(),
            duration,
            target_count
        );
        self.handle = Some(runtime.spawn(worker.run()));
        Ok(())
    }

    pub fn pause(&self) -> Result<(), GeneratorError> {
        self.transition(GeneratorState::Paused)?;
        info!("Traffic generator paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<(), GeneratorError> {
        self.transition(GeneratorState::Running)?;
        info!("Traffic generator resumed");
        Ok(())
    }

    /// Signal the task to stop and wait at most `join_timeout` for it to exit
    pub async fn stop(&mut self, join_timeout: Duration) -> Result<TrafficStats, GeneratorError> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(GeneratorError::NotActive);
        };
        self.control.send_replace(GeneratorState::Stopped);

        match timeout(join_timeout, handle).await {
            Ok(joined) => {
                self.handle = None;
                if let Err(e) = joined {
                    warn!("Traffic generator task ended abnormally: {}", e);
                }
                let stats = self.stats();
                info!(
                    "Traffic generator stopped after {} calls ({} accepted, {} blocked)",
                    stats.generated, stats.accepted, stats.blocked
                );
                Ok(stats)
            }
            Err(_) => {
                let waited_ms = u64::try_from(join_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!("Traffic generator did not stop within {}ms", waited_ms);
                Err(GeneratorError::JoinTimeout { waited_ms })
            }
        }
    }

    /// Wait for a run to end on its own
    pub async fn wait(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.await {
                warn!("Traffic generator task ended abnormally: {}", e);
            }
            self.handle = None;
        }
    }

    pub fn report(&self, top_n: usize) -> TrafficReport {
        let stats = self.stats();
        let top = read(&self.call_log).popularity().top_n(top_n);
        TrafficReport {
            generated: stats.generated,
            accepted: stats.accepted,
            blocked: stats.blocked,
            average_duration_secs: stats.average_duration_secs(),
            top,
        }
    }

    pub fn state(&self) -> GeneratorState {
        *self.control.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn stats(&self) -> TrafficStats {
        *lock(&self.stats)
    }

    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    /// Move an active run to `target`; a run already in `target` is left alone
    fn transition(&self, target: GeneratorState) -> Result<(), GeneratorError> {
        let mut outcome = Err(GeneratorError::NotActive);
        self.control.send_if_modified(|state| {
            if !state.is_active() {
                return false;
            }
            outcome = Ok(());
            if *state == target {
                return false;
            }
            *state = target;
            true
        });
        outcome
    }
}

impl Drop for TrafficGenerator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.control.send_replace(GeneratorState::Stopped);
            handle.abort();
        }
    }
}

impl std::fmt::Debug for TrafficGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficGenerator")
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Background Worker
// ----------------------------------------------------------------------------

struct TrafficWorker {
    identifiers: Vec<PhoneNumber>,
    duration: Duration,
    target_count: u64,
    config: TrafficConfig,
    call_log: Shared<CallLog>,
    blocklist: Shared<Blocklist>,
    stats: Arc<Mutex<TrafficStats>>,
    control: watch::Receiver<GeneratorState>,
    state: Arc<watch::Sender<GeneratorState>>,
    rng: StdRng,
}

impl TrafficWorker {
    async fn run(mut self) {
        let throttle = self.config.throttle(self.duration, self.target_count);
        let mut active = Duration::ZERO;
        let mut generated = 0u64;

        loop {
            let state = *self.control.borrow_and_update();
            match state {
                GeneratorState::Stopped | GeneratorState::Idle => break,
                GeneratorState::Paused => {
                    self.wait_while_paused().await;
                    continue;
                }
                GeneratorState::Running => {}
            }
            if active >= self.duration || generated >= self.target_count {
                break;
            }

            let slice = Instant::now();
            self.generate_one();
            generated += 1;

            if throttle.is_zero() {
                tokio::task::yield_now().await;
            } else {
                // A state change cuts the sleep short so pause and stop take effect promptly
                tokio::select! {
                    _ = sleep(throttle) => {}
                    _ = self.control.changed() => {}
                }
            }
            active += slice.elapsed();
        }

        self.state.send_replace(GeneratorState::Stopped);
        let stats = *lock(&self.stats);
        info!(
            "Traffic generator finished: {} generated, {} accepted, {} blocked, avg {:.2}s",
            stats.generated,
            stats.accepted,
            stats.blocked,
            stats.average_duration_secs()
        );
    }

    async fn wait_while_paused(&mut self) {
        let poll = self.config.poll_interval();
        while *self.control.borrow_and_update() == GeneratorState::Paused {
            tokio::select! {
                _ = sleep(poll) => {}
                _ = self.control.changed() => {}
            }
        }
    }

    fn generate_one(&mut self) {
        let (caller, callee) = self.pick_pair();
        let secs = self.pick_duration_secs();

        let blocked = read(&self.blocklist).blocks_call(&caller, &callee);
        if blocked {
            debug!("Synthetic call {} -> {} blocked", caller, callee);
        } else {
            write(&self.call_log).record(
                caller,
                callee,
                Local::now().naive_local(),
                Duration::from_secs(secs),
            );
        }

        let mut stats = lock(&self.stats);
        stats.generated += 1;
        if blocked {
            stats.blocked += 1;
        } else {
            stats.accepted += 1;
            stats.total_duration_secs += secs;
        }
    }

    /// Two distinct numbers, uniformly
    fn pick_pair(&mut self) -> (PhoneNumber, PhoneNumber) {
        let count = self.identifiers.len();
        let first = self.rng.gen_range(0..count);
        let mut second = self.rng.gen_range(0..count - 1);
        if second >= first {
            second += 1;
        }
        (
            self.identifiers[first].clone(),
            self.identifiers[second].clone(),
        )
    }

    fn pick_duration_secs(&mut self) -> u64 {
        let (min, max) = if self.rng.gen::<f64>() < self.config.short_call_ratio {
            (self.config.short_call_min_secs, self.config.short_call_max_secs)
        } else {
            (self.config.long_call_min_secs, self.config.long_call_max_secs)
        };
        if min >= max {
            min
        } else {
            self.rng.gen_range(min..=max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::shared;

    fn worker(identifiers: &[&str], config: TrafficConfig) -> TrafficWorker {
        let (sender, control) = watch::channel(GeneratorState::Running);
        TrafficWorker {
            identifiers: identifiers.iter().map(|n| PhoneNumber::new(n)).collect(),
            duration: Duration::from_secs(1),
            target_count: 10,
            rng: StdRng::seed_from_u64(config.seed.unwrap_or(1)),
            config,
            call_log: shared(CallLog::new()),
            blocklist: shared(Blocklist::new()),
            stats: Arc::new(Mutex::new(TrafficStats::default())),
            control,
            state: Arc::new(sender),
        }
    }

    #[test]
    fn test_pick_pair_is_distinct() {
        let mut picker = worker(&["001", "002"], TrafficConfig::testing());
        for _ in 0..100 {
            let (caller, callee) = picker.pick_pair();
            assert_ne!(caller, callee);
        }
    }

    #[test]
    fn test_durations_respect_ranges() {
        let mut mixed = worker(&["001", "002"], TrafficConfig::testing());
        for _ in 0..500 {
            let secs = mixed.pick_duration_secs();
            assert!((1..=3600).contains(&secs));
        }

        let mut all_long = worker(
            &["001", "002"],
            TrafficConfig {
                short_call_ratio: 0.0,
                ..TrafficConfig::testing()
            },
        );
        for _ in 0..100 {
            assert!(all_long.pick_duration_secs() >= 300);
        }
    }

    #[test]
    fn test_blocked_calls_are_counted_not_recorded() {
        let mut blocking = worker(&["001", "002"], TrafficConfig::testing());
        write(&blocking.blocklist).block(PhoneNumber::new("002"));
        blocking.generate_one();

        let stats = *lock(&blocking.stats);
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.accepted, 0);
        assert!(read(&blocking.call_log).is_empty());
    }

    #[test]
    fn test_average_duration() {
        let stats = TrafficStats {
            generated: 3,
            accepted: 2,
            blocked: 1,
            total_duration_secs: 90,
        };
        assert_eq!(stats.average_duration_secs(), 45.0);
        assert_eq!(TrafficStats::default().average_duration_secs(), 0.0);
    }

    #[test]
    fn test_transitions_require_active_run() {
        let generator = TrafficGenerator::new(
            TrafficConfig::testing(),
            shared(CallLog::new()),
            shared(Blocklist::new()),
        );
        assert_eq!(generator.state(), GeneratorState::Idle);
        assert_eq!(generator.pause(), Err(GeneratorError::NotActive));
        assert_eq!(generator.resume(), Err(GeneratorError::NotActive));
    }

    #[test]
    fn test_start_outside_runtime() {
        let mut generator = TrafficGenerator::new(
            TrafficConfig::testing(),
            shared(CallLog::new()),
            shared(Blocklist::new()),
        );
        let numbers = vec![PhoneNumber::new("001"), PhoneNumber::new("002")];
        assert_eq!(
            generator.start(numbers, Duration::from_secs(1), 1),
            Err(GeneratorError::NoRuntime)
        );
        assert_eq!(generator.state(), GeneratorState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_times_out_and_can_retry() {
        let call_log = shared(CallLog::new());
        let mut generator = TrafficGenerator::new(
            TrafficConfig::testing(),
            Arc::clone(&call_log),
            shared(Blocklist::new()),
        );
        let numbers = vec![PhoneNumber::new("001"), PhoneNumber::new("002")];

        // Keep the call log write-locked so the worker blocks inside its first call
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let holder = {
            let call_log = Arc::clone(&call_log);
            std::thread::spawn(move || {
                let _guard = write(&call_log);
                let _ = locked_tx.send(());
                let _ = release_rx.recv();
            })
        };
        locked_rx.recv().unwrap();

        generator
            .start(numbers.clone(), Duration::from_secs(60), 1_000_000)
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        assert_eq!(
            generator.stop(Duration::from_millis(50)).await,
            Err(GeneratorError::JoinTimeout { waited_ms: 50 })
        );
        assert_eq!(
            generator.start(numbers, Duration::from_secs(60), 1),
            Err(GeneratorError::AlreadyRunning)
        );

        release_tx.send(()).unwrap();
        holder.join().unwrap();

        let stats = generator.stop(Duration::from_secs(5)).await.unwrap();
        assert_eq!(stats.generated, 1);
        assert_eq!(read(&call_log).len(), 1);
        assert_eq!(generator.state(), GeneratorState::Stopped);
    }
}
