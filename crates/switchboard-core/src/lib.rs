//! Switchboard Core
//!
//! In-memory indexing structures for the phone switchboard: the contact directory with
//! its prefix indices, the append-only call log with per-number and per-pair history
//! indices, and the popularity graph that scores numbers from their call traffic.
//!
//! Everything in this crate is synchronous and lock-free by itself. Sharing between the
//! foreground caller and the background traffic generator is arranged by
//! `switchboard-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod blocklist;
pub mod call_log;
pub mod config;
pub mod directory;
pub mod errors;
pub mod loader;
pub mod popularity;
pub mod prefix_index;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use blocklist::Blocklist;
pub use call_log::{CallLog, CallLogSnapshot};
pub use config::{LoadConfig, SearchConfig, SwitchboardConfig, TrafficConfig};
pub use directory::{Directory, DirectorySnapshot, NameSuggestion};
pub use errors::{GeneratorError, Result, SwitchboardError, SwitchboardResult};
pub use popularity::{EdgeWeight, GraphSnapshot, PopularityGraph, ReceivedTally};
pub use prefix_index::PrefixIndex;
pub use types::{CallRecord, Contact, PairKey, PhoneNumber, SearchField};
