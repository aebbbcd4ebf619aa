//! Switchboard Runtime
//!
//! This crate wires the core structures into a running service:
//! - `Engine`: the composition root that owns the directory, blocklist and call log
//!   behind their locks and exposes every query and mutation
//! - `TrafficGenerator`: the background task that feeds synthetic calls into the log
//!   while foreground queries keep running
//!
//! `switchboard-core` provides the data structures; this crate decides how they are
//! shared.

pub mod engine;
pub mod generator;
mod shared;

pub use engine::{CallOutcome, Engine, EngineSnapshot, LoadSummary, SearchHit};
pub use generator::{GeneratorState, TrafficGenerator, TrafficReport, TrafficStats};

// Re-export core types for convenience
pub use switchboard_core::{
    CallRecord, Contact, GeneratorError, PhoneNumber, SearchField, SwitchboardConfig,
    SwitchboardError, SwitchboardResult,
};
