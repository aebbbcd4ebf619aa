//! Blocked numbers
//!
//! Every call-recording path except history replay checks both parties here before a
//! call reaches the log.

use crate::PhoneNumber;
use hashbrown::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    numbers: HashSet<PhoneNumber>,
}

impl Blocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a number; returns false if it was already blocked or is empty
    pub fn block(&mut self, number: PhoneNumber) -> bool {
        if number.is_empty() {
            return false;
        }
        self.numbers.insert(number)
    }

    pub fn unblock(&mut self, number: &str) -> bool {
        self.numbers.remove(number)
    }

    pub fn is_blocked(&self, number: &str) -> bool {
        self.numbers.contains(number)
    }

    /// A call is rejected when either party is blocked
    pub fn blocks_call(&self, caller: &str, callee: &str) -> bool {
        self.is_blocked(caller) || self.is_blocked(callee)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Blocked numbers, sorted for stable snapshots
    pub fn to_sorted_vec(&self) -> Vec<PhoneNumber> {
        let mut numbers: Vec<PhoneNumber> = self.numbers.iter().cloned().collect();
        numbers.sort();
        numbers
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }
}

impl FromIterator<PhoneNumber> for Blocklist {
    fn from_iter<T: IntoIterator<Item = PhoneNumber>>(iter: T) -> Self {
        let mut blocklist = Blocklist::new();
        blocklist.extend(iter);
        blocklist
    }
}

impl Extend<PhoneNumber> for Blocklist {
    fn extend<T: IntoIterator<Item = PhoneNumber>>(&mut self, iter: T) {
        for number in iter {
            self.block(number);
        }
    }
}
