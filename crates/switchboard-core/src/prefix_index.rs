//! Trie-backed prefix index
//!
//! Maps lowercase text keys to the numbers filed under them. Every node on a key's path
//! carries the accumulated set of numbers inserted under any key passing through it, so a
//! prefix lookup is a descent of `prefix.len()` steps with no subtree walk.

use crate::PhoneNumber;
use hashbrown::{HashMap, HashSet};

// ----------------------------------------------------------------------------
// Trie Node
// ----------------------------------------------------------------------------

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, NodeId>,
    /// Accumulated numbers in first-insertion order
    numbers: Vec<PhoneNumber>,
    members: HashSet<PhoneNumber>,
    terminal: bool,
}

impl TrieNode {
    fn accumulate(&mut self, number: &PhoneNumber) {
        if self.members.insert(number.clone()) {
            self.numbers.push(number.clone());
        }
    }
}

// ----------------------------------------------------------------------------
// Prefix Index
// ----------------------------------------------------------------------------

/// Case-insensitive prefix index over phone numbers
///
/// Nodes live in an arena and refer to their children by index. Lookup results come back
/// in first-insertion order, so truncation by `limit` is deterministic.
#[derive(Debug)]
pub struct PrefixIndex {
    nodes: Vec<TrieNode>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    /// File `number` under `key` and every prefix of it
    pub fn insert(&mut self, key: &str, number: &PhoneNumber) {
        let mut current = ROOT;
        for ch in key.to_lowercase().chars() {
            current = match self.nodes[current].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(ch, child);
                    child
                }
            };
            self.nodes[current].accumulate(number);
        }
        self.nodes[current].terminal = true;
    }

    /// Up to `limit` numbers whose key starts with `prefix`
    ///
    /// Returns an empty list when no key has this prefix. The root holds no numbers, so
    /// an empty prefix also yields nothing.
    pub fn prefix_lookup(&self, prefix: &str, limit: usize) -> Vec<PhoneNumber> {
        match self.descend(prefix) {
            Some(node) => self.nodes[node].numbers.iter().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Number of distinct numbers under `prefix`
    pub fn prefix_count(&self, prefix: &str) -> usize {
        self.descend(prefix)
            .map(|node| self.nodes[node].numbers.len())
            .unwrap_or(0)
    }

    /// Whether `key` was inserted as a complete key
    pub fn is_complete_key(&self, key: &str) -> bool {
        self.descend(key)
            .map(|node| node != ROOT && self.nodes[node].terminal)
            .unwrap_or(false)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(TrieNode::default());
    }

    fn descend(&self, prefix: &str) -> Option<NodeId> {
        let mut current = ROOT;
        for ch in prefix.to_lowercase().chars() {
            current = *self.nodes[current].children.get(&ch)?;
        }
        Some(current)
    }
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}
