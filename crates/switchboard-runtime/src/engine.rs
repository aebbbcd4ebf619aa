//! Engine
//!
//! Composition root for the switchboard. Owns the directory, the blocklist and the call
//! log (which in turn owns the popularity graph), each behind its own lock, plus the
//! traffic generator that writes into the same log.
//!
//! Locks are always taken in the order directory, blocklist, call log. Only `stop` and
//! `shutdown` await; every other operation is synchronous and never holds a lock across
//! an await point.

use crate::generator::{GeneratorState, TrafficGenerator, TrafficReport, TrafficStats};
use crate::shared::{read, shared, write, Shared};
use chrono::NaiveDateTime;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use switchboard_core::{
    Blocklist, CallLog, CallLogSnapshot, CallRecord, Contact, Directory, DirectorySnapshot,
    GeneratorError, GraphSnapshot, NameSuggestion, PhoneNumber, SearchField, SwitchboardConfig,
    SwitchboardError, SwitchboardResult,
};
use tracing::{debug, info};

// ----------------------------------------------------------------------------
// Result Types
// ----------------------------------------------------------------------------

/// A ranked search or autocomplete hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub number: PhoneNumber,
    /// `None` for numbers that only appear in the call log
    pub contact: Option<Contact>,
    pub score: f64,
}

/// Outcome of a blocklist-checked call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Recorded(Arc<CallRecord>),
    Blocked,
}

impl CallOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Counts from a blocklist-checked replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Everything needed to rebuild an engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub contacts: DirectorySnapshot,
    pub blocked: Vec<PhoneNumber>,
    pub calls: CallLogSnapshot,
    pub popularity: GraphSnapshot,
}

// ----------------------------------------------------------------------------
// Engine
// ----------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine {
    config: SwitchboardConfig,
    directory: Shared<Directory>,
    blocklist: Shared<Blocklist>,
    call_log: Shared<CallLog>,
    generator: TrafficGenerator,
}

impl Engine {
    /// Create an empty engine after validating `config`
    pub fn new(config: SwitchboardConfig) -> SwitchboardResult<Self> {
        config.validate()?;

        let directory = shared(Directory::new());
        let blocklist = shared(Blocklist::new());
        let call_log = shared(CallLog::new());
        let generator = TrafficGenerator::new(
            config.traffic.clone(),
            Arc::clone(&call_log),
            Arc::clone(&blocklist),
        );

        Ok(Self {
            config,
            directory,
            blocklist,
            call_log,
            generator,
        })
    }

    pub fn config(&self) -> &SwitchboardConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    /// Add parsed phonebook entries; returns how many were stored
    pub fn load_contacts<I>(&self, contacts: I) -> SwitchboardResult<usize>
    where
        I: IntoIterator<Item = Contact>,
    {
        let mut directory = write(&self.directory);
        let mut loaded = 0;
        for contact in contacts {
            directory.insert(contact)?;
            loaded += 1;
        }
        info!("Loaded {} contacts ({} in directory)", loaded, directory.len());
        Ok(loaded)
    }

    /// Replay historical calls into the log without consulting the blocklist
    pub fn load_calls<I>(&self, calls: I) -> usize
    where
        I: IntoIterator<Item = CallRecord>,
    {
        let mut log = write(&self.call_log);
        let before = log.len();
        for record in calls {
            log.record_entry(record);
        }
        let loaded = log.len() - before;
        info!("Loaded {} calls ({} in log)", loaded, log.len());
        loaded
    }

    /// Drop the log and the popularity graph, then load `calls`
    pub fn reload_calls<I>(&self, calls: I) -> SwitchboardResult<usize>
    where
        I: IntoIterator<Item = CallRecord>,
    {
        if self.generator.is_active() {
            return Err(GeneratorError::AlreadyRunning.into());
        }
        {
            let mut log = write(&self.call_log);
            log.reset();
            log.popularity_mut().clear();
        }
        Ok(self.load_calls(calls))
    }

    /// Add numbers to the blocklist; returns how many were new
    pub fn load_blocked<I>(&self, numbers: I) -> usize
    where
        I: IntoIterator<Item = PhoneNumber>,
    {
        let mut blocklist = write(&self.blocklist);
        let added = numbers
            .into_iter()
            .filter(|number| blocklist.block(number.clone()))
            .count();
        info!("Blocked {} numbers ({} total)", added, blocklist.len());
        added
    }

    /// Replay calls through the blocklist
    pub fn simulate_calls<I>(&self, calls: I) -> LoadSummary
    where
        I: IntoIterator<Item = CallRecord>,
    {
        let blocklist = read(&self.blocklist);
        let mut log = write(&self.call_log);
        let mut summary = LoadSummary::default();
        for record in calls {
            if blocklist.blocks_call(&record.caller, &record.callee) {
                debug!("Rejected call {} -> {}", record.caller, record.callee);
                summary.rejected += 1;
            } else {
                log.record_entry(record);
                summary.accepted += 1;
            }
        }
        info!(
            "Simulated calls: {} accepted, {} rejected",
            summary.accepted, summary.rejected
        );
        summary
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Store `contact` under `number`, replacing any previous entry
    pub fn put_contact(&self, number: PhoneNumber, contact: Contact) -> SwitchboardResult<()> {
        write(&self.directory).put(number, contact)
    }

    pub fn insert_contact(&self, contact: Contact) -> SwitchboardResult<()> {
        write(&self.directory).insert(contact)
    }

    /// Record one call unless either party is blocked
    pub fn record_call(
        &self,
        caller: impl Into<PhoneNumber>,
        callee: impl Into<PhoneNumber>,
        start_time: NaiveDateTime,
        duration: Duration,
    ) -> SwitchboardResult<CallOutcome> {
        let caller: PhoneNumber = caller.into();
        let callee: PhoneNumber = callee.into();
        if caller.is_empty() {
            return Err(SwitchboardError::invalid_key("caller", caller.as_str()));
        }
        if callee.is_empty() {
            return Err(SwitchboardError::invalid_key("callee", callee.as_str()));
        }

        let blocklist = read(&self.blocklist);
        if blocklist.blocks_call(&caller, &callee) {
            info!("Call {} -> {} rejected: number is blocked", caller, callee);
            return Ok(CallOutcome::Blocked);
        }
        let record = write(&self.call_log).record(caller, callee, start_time, duration);
        Ok(CallOutcome::Recorded(record))
    }

    pub fn block(&self, number: impl Into<PhoneNumber>) -> bool {
        write(&self.blocklist).block(number.into())
    }

    pub fn unblock(&self, number: &str) -> bool {
        write(&self.blocklist).unblock(number)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Up to `limit` numbers whose `field` starts with `text`, most popular first
    pub fn search_by_prefix(&self, field: SearchField, text: &str, limit: usize) -> Vec<SearchHit> {
        self.ranked_hits(field, text, limit, limit)
    }

    /// Rank a wider pool of candidates, then keep the best `limit`
    pub fn autocomplete(&self, field: SearchField, prefix: &str, limit: usize) -> Vec<SearchHit> {
        let pool = self.config.search.autocomplete_pool.max(limit);
        self.ranked_hits(field, prefix, pool, limit)
    }

    pub fn history_for(&self, number: &str) -> Vec<Arc<CallRecord>> {
        read(&self.call_log).history_for(number.trim())
    }

    pub fn history_between(&self, a: &str, b: &str) -> Vec<Arc<CallRecord>> {
        read(&self.call_log).history_between(a.trim(), b.trim())
    }

    pub fn score(&self, number: &str) -> f64 {
        read(&self.call_log).popularity().score(number.trim())
    }

    pub fn top_n(&self, n: usize) -> Vec<(PhoneNumber, f64)> {
        read(&self.call_log).popularity().top_n(n)
    }

    /// "Did you mean" candidates for an unknown number
    pub fn suggest_numbers(&self, query: &str) -> Vec<PhoneNumber> {
        read(&self.directory).similar_by_number(query.trim(), self.config.search.suggestion_count)
    }

    /// "Did you mean" candidates for a mistyped name
    pub fn suggest_names(&self, query: &str) -> Vec<NameSuggestion> {
        read(&self.directory).similar_by_name(query.trim(), self.config.search.suggestion_count)
    }

    pub fn contact(&self, number: &str) -> Option<Contact> {
        read(&self.directory).get(number.trim()).cloned()
    }

    /// "first | last | number" for known numbers, the bare number otherwise
    pub fn display_name(&self, number: &str) -> String {
        match self.contact(number) {
            Some(contact) => contact.to_string(),
            None => number.trim().to_string(),
        }
    }

    pub fn is_blocked(&self, number: &str) -> bool {
        read(&self.blocklist).is_blocked(number.trim())
    }

    pub fn contact_count(&self) -> usize {
        read(&self.directory).len()
    }

    pub fn call_count(&self) -> usize {
        read(&self.call_log).len()
    }

    pub fn blocked_count(&self) -> usize {
        read(&self.blocklist).len()
    }

    fn ranked_hits(&self, field: SearchField, text: &str, pool: usize, limit: usize) -> Vec<SearchHit> {
        let directory = read(&self.directory);
        let candidates = directory.prefix_lookup(field, text.trim(), pool);
        let log = read(&self.call_log);
        let graph = log.popularity();

        let mut hits: Vec<SearchHit> = candidates
            .into_iter()
            .map(|number| SearchHit {
                score: graph.score(&number),
                contact: directory.get(&number).cloned(),
                number,
            })
            .collect();
        // Stable: equal scores keep prefix-index order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    // ------------------------------------------------------------------------
    // Traffic Generator
    // ------------------------------------------------------------------------

    /// Start synthetic traffic over every number in the directory
    pub fn start_traffic(&mut self, duration: Duration, target_count: u64) -> SwitchboardResult<()> {
        let identifiers = read(&self.directory).identifiers();
        self.generator.start(identifiers, duration, target_count)?;
        Ok(())
    }

    pub fn pause_traffic(&self) -> SwitchboardResult<()> {
        Ok(self.generator.pause()?)
    }

    pub fn resume_traffic(&self) -> SwitchboardResult<()> {
        Ok(self.generator.resume()?)
    }

    /// Stop the generator, waiting up to the configured join timeout
    pub async fn stop_traffic(&mut self) -> SwitchboardResult<TrafficStats> {
        let join_timeout = self.config.traffic.join_timeout();
        self.stop_traffic_within(join_timeout).await
    }

    pub async fn stop_traffic_within(&mut self, join_timeout: Duration) -> SwitchboardResult<TrafficStats> {
        Ok(self.generator.stop(join_timeout).await?)
    }

    /// Wait for the current run to finish on its own
    pub async fn wait_traffic(&mut self) {
        self.generator.wait().await;
    }

    pub fn traffic_report(&self) -> TrafficReport {
        self.generator.report(self.config.search.report_top_n)
    }

    pub fn traffic_state(&self) -> GeneratorState {
        self.generator.state()
    }

    pub fn traffic_stats(&self) -> TrafficStats {
        self.generator.stats()
    }

    // ------------------------------------------------------------------------
    // Snapshots and Teardown
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> EngineSnapshot {
        let directory = read(&self.directory);
        let blocklist = read(&self.blocklist);
        let log = read(&self.call_log);
        EngineSnapshot {
            contacts: directory.snapshot(),
            blocked: blocklist.to_sorted_vec(),
            calls: log.snapshot(),
            popularity: log.popularity().serialize(),
        }
    }

    /// Replace all state with `snapshot`; refused while traffic is being generated
    pub fn restore(&self, snapshot: EngineSnapshot) -> SwitchboardResult<()> {
        if self.generator.is_active() {
            return Err(GeneratorError::AlreadyRunning.into());
        }

        let mut directory = write(&self.directory);
        let mut blocklist = write(&self.blocklist);
        let mut log = write(&self.call_log);

        // Only fallible step; a failure leaves every store untouched
        directory.restore(snapshot.contacts)?;
        blocklist.clear();
        blocklist.extend(snapshot.blocked);
        log.restore(snapshot.calls);
        log.popularity_mut().restore(snapshot.popularity);

        info!(
            "Restored {} contacts, {} blocked numbers, {} calls",
            directory.len(),
            blocklist.len(),
            log.len()
        );
        Ok(())
    }

    /// Stop any running generator
    pub async fn shutdown(&mut self) -> SwitchboardResult<()> {
        match self.stop_traffic().await {
            Ok(_) | Err(SwitchboardError::Generator(GeneratorError::NotActive)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    fn engine() -> Engine {
        let engine = Engine::new(SwitchboardConfig::testing()).unwrap();
        engine
            .load_contacts(vec![
                Contact::new("001", "Ana", "Lee"),
                Contact::new("002", "Bo", "Kim"),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SwitchboardConfig::testing();
        config.search.autocomplete_pool = 1;
        assert!(matches!(
            Engine::new(config),
            Err(SwitchboardError::Configuration { .. })
        ));
    }

    #[test]
    fn test_record_call_rejects_empty_numbers() {
        let engine = engine();
        let err = engine
            .record_call(" ", "002", at(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::InvalidKey { field: "caller", .. }));
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_display_name() {
        let engine = engine();
        assert_eq!(engine.display_name("001"), "Ana | Lee | 001");
        assert_eq!(engine.display_name("777"), "777");
    }

    #[test]
    fn test_reload_resets_graph() {
        let engine = engine();
        engine.load_calls(vec![CallRecord::new("001", "002", at(1), Duration::from_secs(60))]);
        assert!(engine.score("001") > 0.0);

        let reloaded = engine
            .reload_calls(vec![CallRecord::new("002", "001", at(2), Duration::from_secs(30))])
            .unwrap();
        assert_eq!(reloaded, 1);
        assert_eq!(engine.call_count(), 1);
        // 001: in-degree 1 (200) + 30s inbound
        assert_eq!(engine.score("001"), 230.0);
    }
}
