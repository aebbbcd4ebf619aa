//! Append-only call log
//!
//! Records are owned by the log and shared into the per-number and per-pair indices as
//! `Arc` handles, never copied. The log also owns the popularity graph: every recorded
//! call is forwarded to it, so one lock around the log covers both.

use crate::popularity::PopularityGraph;
use crate::{CallRecord, PairKey, PhoneNumber};
use chrono::NaiveDateTime;
use core::time::Duration;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// ----------------------------------------------------------------------------
// Snapshot Types
// ----------------------------------------------------------------------------

/// Plain copy of the log, in recording order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallLogSnapshot {
    pub calls: Vec<CallRecord>,
}

// ----------------------------------------------------------------------------
// Call Log Implementation
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CallLog {
    /// Records in recording order
    records: Vec<Arc<CallRecord>>,
    /// Records indexed by each party
    by_number: HashMap<PhoneNumber, Vec<Arc<CallRecord>>>,
    /// Records indexed by unordered pair of parties
    by_pair: HashMap<PairKey, Vec<Arc<CallRecord>>>,
    popularity: PopularityGraph,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and forward it to the popularity graph
    pub fn record(
        &mut self,
        caller: PhoneNumber,
        callee: PhoneNumber,
        start_time: NaiveDateTime,
        duration: Duration,
    ) -> Arc<CallRecord> {
        self.record_entry(CallRecord {
            caller,
            callee,
            start_time,
            duration,
        })
    }

    /// Append an already built record and forward it to the popularity graph
    pub fn record_entry(&mut self, record: CallRecord) -> Arc<CallRecord> {
        let record = self.append(record);
        self.popularity
            .record_call(&record.caller, &record.callee, record.duration_secs());
        debug!(
            "Recorded call {} -> {} ({}s)",
            record.caller,
            record.callee,
            record.duration.as_secs()
        );
        record
    }

    /// Calls involving `number`, oldest first
    pub fn history_for(&self, number: &str) -> Vec<Arc<CallRecord>> {
        self.by_number
            .get(number)
            .map(|records| sorted_by_start(records))
            .unwrap_or_default()
    }

    /// Calls between `a` and `b` in either direction, oldest first
    pub fn history_between(&self, a: &str, b: &str) -> Vec<Arc<CallRecord>> {
        let key = PairKey::new(PhoneNumber::new(a), PhoneNumber::new(b));
        self.by_pair
            .get(&key)
            .map(|records| sorted_by_start(records))
            .unwrap_or_default()
    }

    /// All records in recording order
    pub fn records(&self) -> &[Arc<CallRecord>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn popularity(&self) -> &PopularityGraph {
        &self.popularity
    }

    pub fn popularity_mut(&mut self) -> &mut PopularityGraph {
        &mut self.popularity
    }

    /// Drop every record and both indices; the popularity graph is kept
    pub fn reset(&mut self) {
        self.records.clear();
        self.by_number.clear();
        self.by_pair.clear();
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> CallLogSnapshot {
        CallLogSnapshot {
            calls: self.records.iter().map(|record| (**record).clone()).collect(),
        }
    }

    /// Replace the records with `snapshot`
    ///
    /// The graph is not touched: it is restored from its own snapshot, and replaying the
    /// calls into it here would count them twice.
    pub fn restore(&mut self, snapshot: CallLogSnapshot) {
        self.reset();
        for record in snapshot.calls {
            self.append(record);
        }
    }

    fn append(&mut self, record: CallRecord) -> Arc<CallRecord> {
        let record = Arc::new(record);
        self.records.push(Arc::clone(&record));

        self.by_number
            .entry(record.caller.clone())
            .or_default()
            .push(Arc::clone(&record));
        if record.callee != record.caller {
            self.by_number
                .entry(record.callee.clone())
                .or_default()
                .push(Arc::clone(&record));
        }

        self.by_pair
            .entry(record.pair_key())
            .or_default()
            .push(Arc::clone(&record));

        record
    }
}

fn sorted_by_start(records: &[Arc<CallRecord>]) -> Vec<Arc<CallRecord>> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| record.start_time);
    sorted
}
