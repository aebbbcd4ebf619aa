//! Line parsers for phonebook, call and blocked-number files
//!
//! Pure functions over text; reading the files is left to the caller. Malformed
//! timestamps and durations never abort a load: they fall back to the current local time
//! and a zero duration, and the line is kept.

use crate::{CallRecord, Contact, PhoneNumber};
use chrono::{Local, NaiveDateTime};
use core::time::Duration;
use tracing::warn;

/// Timestamp layout used by call files
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

// ----------------------------------------------------------------------------
// Phonebook
// ----------------------------------------------------------------------------

/// Parse `"First Last, number"`
///
/// The first word of the name is the first name, the rest is the last name.
pub fn parse_contact_line(line: &str) -> Option<Contact> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some((name, number)) = line.split_once(',') else {
        warn!("Skipping phonebook line without a number: {:?}", line);
        return None;
    };
    let number = PhoneNumber::new(number);
    if number.is_empty() {
        warn!("Skipping phonebook line without a number: {:?}", line);
        return None;
    }

    let mut words = name.split_whitespace();
    let first_name = words.next().unwrap_or_default().to_string();
    let last_name = words.collect::<Vec<_>>().join(" ");
    Some(Contact {
        number,
        first_name,
        last_name,
    })
}

/// Parse a whole phonebook file
pub fn parse_phonebook(text: &str, has_header: bool) -> Vec<Contact> {
    text.lines()
        .skip(usize::from(has_header))
        .filter_map(parse_contact_line)
        .collect()
}

// ----------------------------------------------------------------------------
// Calls
// ----------------------------------------------------------------------------

/// A call line plus which fields had to be defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCall {
    pub record: CallRecord,
    pub defaulted_start: bool,
    pub defaulted_duration: bool,
}

/// Parse `"caller, callee, 01.02.2025 10:00:00, 0:05:30"`
///
/// Lines with fewer than four fields are skipped.
pub fn parse_call_line(line: &str) -> Option<ParsedCall> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        warn!("Skipping call line with {} fields: {:?}", fields.len(), line);
        return None;
    }

    let (start_time, defaulted_start) = match parse_timestamp(fields[2]) {
        Some(start) => (start, false),
        None => {
            warn!("Unreadable call start {:?}, using current time", fields[2]);
            (Local::now().naive_local(), true)
        }
    };
    let (duration, defaulted_duration) = match parse_duration(fields[3]) {
        Some(duration) => (duration, false),
        None => {
            warn!("Unreadable call duration {:?}, using zero", fields[3]);
            (Duration::ZERO, true)
        }
    };

    Some(ParsedCall {
        record: CallRecord::new(fields[0], fields[1], start_time, duration),
        defaulted_start,
        defaulted_duration,
    })
}

/// Parse a whole call file, keeping at most `limit` lines
pub fn parse_calls(text: &str, limit: Option<usize>) -> Vec<CallRecord> {
    text.lines()
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(parse_call_line)
        .map(|parsed| parsed.record)
        .collect()
}

/// Parse a blocked-number file, one number per line
pub fn parse_blocked(text: &str) -> Vec<PhoneNumber> {
    text.lines()
        .map(PhoneNumber::new)
        .filter(|number| !number.is_empty())
        .collect()
}

// ----------------------------------------------------------------------------
// Field Helpers
// ----------------------------------------------------------------------------

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// Parse `H:M:S`; `None` if malformed or out of range
pub fn parse_duration(text: &str) -> Option<Duration> {
    let mut parts = text.trim().split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Format as `H:MM:SS`, dropping sub-second precision
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
