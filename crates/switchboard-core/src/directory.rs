//! Contact Directory
//!
//! Owns every contact, keyed by phone number, and keeps the first name, last name and
//! number prefix indices in step with it. Also ranks "did you mean" suggestions for
//! numbers and names that are not in the directory.

use crate::prefix_index::PrefixIndex;
use crate::{Contact, PhoneNumber, Result, SearchField, SwitchboardError};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ----------------------------------------------------------------------------
// Snapshot Types
// ----------------------------------------------------------------------------

/// Plain copy of the directory contents, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub contacts: Vec<Contact>,
}

/// A ranked name suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSuggestion {
    pub full_name: String,
    pub number: PhoneNumber,
}

// ----------------------------------------------------------------------------
// Directory Implementation
// ----------------------------------------------------------------------------

/// Contact directory with prefix indices
#[derive(Debug, Default)]
pub struct Directory {
    /// Contacts indexed by number
    contacts: HashMap<PhoneNumber, Contact>,
    /// Numbers in first-insertion order, used to break suggestion ties
    order: Vec<PhoneNumber>,
    first_names: PrefixIndex,
    last_names: PrefixIndex,
    numbers: PrefixIndex,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `contact` under `number`, replacing any previous entry
    ///
    /// The number is re-filed in all three prefix indices and becomes the stored contact's
    /// number. Index entries for a replaced contact's old names are kept, since the indices
    /// have no deletion.
    pub fn put(&mut self, number: PhoneNumber, mut contact: Contact) -> Result<()> {
        if number.is_empty() {
            return Err(SwitchboardError::invalid_key("number", number.as_str()));
        }
        contact.number = number.clone();

        if !contact.first_name.is_empty() {
            self.first_names.insert(&contact.first_name, &number);
        }
        if !contact.last_name.is_empty() {
            self.last_names.insert(&contact.last_name, &number);
        }
        self.numbers.insert(number.as_str(), &number);

        debug!("Directory put {} ({})", number, contact.full_name());
        if self.contacts.insert(number.clone(), contact).is_none() {
            self.order.push(number);
        }
        Ok(())
    }

    /// Store a contact under its own number
    pub fn insert(&mut self, contact: Contact) -> Result<()> {
        self.put(contact.number.clone(), contact)
    }

    pub fn get(&self, number: &str) -> Option<&Contact> {
        self.contacts.get(number)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.contacts.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Contacts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.order.iter().filter_map(|number| self.contacts.get(number))
    }

    /// Known numbers in insertion order
    pub fn identifiers(&self) -> Vec<PhoneNumber> {
        self.order.clone()
    }

    pub fn index(&self, field: SearchField) -> &PrefixIndex {
        match field {
            SearchField::FirstName => &self.first_names,
            SearchField::LastName => &self.last_names,
            SearchField::Number => &self.numbers,
        }
    }

    /// Up to `limit` numbers whose `field` starts with `prefix`
    pub fn prefix_lookup(&self, field: SearchField, prefix: &str, limit: usize) -> Vec<PhoneNumber> {
        self.index(field).prefix_lookup(prefix, limit)
    }

    // ------------------------------------------------------------------------
    // Suggestions
    // ------------------------------------------------------------------------

    /// The `n` known numbers closest to `query`
    pub fn similar_by_number(&self, query: &str, n: usize) -> Vec<PhoneNumber> {
        let mut ranked: Vec<(usize, &PhoneNumber)> = self
            .order
            .iter()
            .map(|candidate| (number_distance(query, candidate.as_str()), candidate))
            .collect();
        // Stable: ties keep insertion order
        ranked.sort_by_key(|(score, _)| *score);
        ranked
            .into_iter()
            .take(n)
            .map(|(_, number)| number.clone())
            .collect()
    }

    /// The `n` contacts whose "first last" name is closest to `query`
    pub fn similar_by_name(&self, query: &str, n: usize) -> Vec<NameSuggestion> {
        let mut ranked: Vec<(i64, NameSuggestion)> = self
            .iter()
            .map(|contact| {
                let full_name = contact.full_name();
                let score = name_distance(query, &full_name);
                (
                    score,
                    NameSuggestion {
                        full_name,
                        number: contact.number.clone(),
                    },
                )
            })
            .collect();
        ranked.sort_by_key(|(score, _)| *score);
        ranked.into_iter().take(n).map(|(_, hit)| hit).collect()
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            contacts: self.iter().cloned().collect(),
        }
    }

    /// Replace the directory contents with `snapshot`, rebuilding all indices
    ///
    /// On error the directory is left unchanged.
    pub fn restore(&mut self, snapshot: DirectorySnapshot) -> Result<()> {
        let mut restored = Directory::new();
        for contact in snapshot.contacts {
            restored.insert(contact)?;
        }
        *self = restored;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
        self.order.clear();
        self.first_names.clear();
        self.last_names.clear();
        self.numbers.clear();
    }
}

// ----------------------------------------------------------------------------
// Dissimilarity Scores
// ----------------------------------------------------------------------------

/// Length difference plus mismatches at aligned positions
pub fn number_distance(a: &str, b: &str) -> usize {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let mismatches = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
    len_a.abs_diff(len_b) + mismatches
}

/// Case-insensitive; like `number_distance` but rewards a shared prefix
pub fn name_distance(a: &str, b: &str) -> i64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let shared_prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    number_distance(&a, &b) as i64 - shared_prefix as i64
}
