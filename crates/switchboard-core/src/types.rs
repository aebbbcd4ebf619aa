//! Core Switchboard Types
//!
//! Phone numbers, contacts, call records and the pair key used by the call log.

use chrono::NaiveDateTime;
use core::fmt;
use core::ops::Deref;
use core::str::FromStr;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;

// ----------------------------------------------------------------------------
// Phone Number
// ----------------------------------------------------------------------------

/// Phone number used as the primary key throughout the switchboard
///
/// Backed by `Arc<str>` so the same number can sit in the directory, every trie node on
/// its path, the call indices and the graph without copying the text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PhoneNumber(Arc<str>);

impl PhoneNumber {
    /// Create a phone number from text, trimming surrounding whitespace
    pub fn new(number: impl AsRef<str>) -> Self {
        Self(Arc::from(number.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of characters in the number
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for PhoneNumber {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PhoneNumber {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PhoneNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PhoneNumber {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0.to_string()
    }
}

// ----------------------------------------------------------------------------
// Contact
// ----------------------------------------------------------------------------

/// Directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub number: PhoneNumber,
    pub first_name: String,
    pub last_name: String,
}

impl Contact {
    pub fn new(
        number: impl Into<PhoneNumber>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// "First Last", used by name suggestions
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.first_name, self.last_name, self.number)
    }
}

// ----------------------------------------------------------------------------
// Call Record
// ----------------------------------------------------------------------------

/// A completed call. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller: PhoneNumber,
    pub callee: PhoneNumber,
    pub start_time: NaiveDateTime,
    pub duration: Duration,
}

impl CallRecord {
    pub fn new(
        caller: impl Into<PhoneNumber>,
        callee: impl Into<PhoneNumber>,
        start_time: NaiveDateTime,
        duration: Duration,
    ) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            start_time,
            duration,
        }
    }

    /// Order-independent key for the two parties
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.caller.clone(), self.callee.clone())
    }

    pub fn involves(&self, number: &str) -> bool {
        self.caller.as_str() == number || self.callee.as_str() == number
    }

    /// The other party of the call, seen from `number`
    pub fn counterpart(&self, number: &str) -> &PhoneNumber {
        if self.caller.as_str() == number {
            &self.callee
        } else {
            &self.caller
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

// ----------------------------------------------------------------------------
// Pair Key
// ----------------------------------------------------------------------------

/// Unordered pair of numbers, stored lexicographically sorted
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    low: PhoneNumber,
    high: PhoneNumber,
}

impl PairKey {
    pub fn new(a: PhoneNumber, b: PhoneNumber) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> &PhoneNumber {
        &self.low
    }

    pub fn high(&self) -> &PhoneNumber {
        &self.high
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}↔{}", self.low, self.high)
    }
}

// ----------------------------------------------------------------------------
// Search Field
// ----------------------------------------------------------------------------

/// Which prefix index a search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    FirstName,
    LastName,
    Number,
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchField::FirstName => write!(f, "first"),
            SearchField::LastName => write!(f, "last"),
            SearchField::Number => write!(f, "phone"),
        }
    }
}

impl FromStr for SearchField {
    type Err = crate::SwitchboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first_name" => Ok(SearchField::FirstName),
            "last" | "last_name" => Ok(SearchField::LastName),
            "phone" | "number" => Ok(SearchField::Number),
            other => Err(crate::SwitchboardError::invalid_key("search field", other)),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
