//! Prefix trie over rule left hand sides.
//!
//! Maps symbol-string prefixes to rule ids. The completion layer uses
//! shortest-prefix lookup to find the rule that reduces a term at a given
//! position; the rule store uses exact lookup to detect duplicate rules.
//! The minimization core only reads the trie indirectly through the rule
//! store.

use crate::rule::RuleId;
use crate::symbol::Symbol;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
struct TrieNode {
    value: Option<RuleId>,
    children: FxHashMap<Symbol, TrieNode>,
}

/// A prefix trie keyed by symbols, with rule ids at the marked nodes.
#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, returning the previous value at that exact key.
    pub fn insert(&mut self, key: &[Symbol], value: RuleId) -> Option<RuleId> {
        let mut node = &mut self.root;
        for symbol in key {
            node = node.children.entry(symbol.clone()).or_default();
        }
        node.value.replace(value)
    }

    /// Value stored at exactly `key`.
    pub fn find_exact(&self, key: &[Symbol]) -> Option<RuleId> {
        let mut node = &self.root;
        for symbol in key {
            node = node.children.get(symbol)?;
        }
        node.value
    }

    /// Value stored at the shortest marked prefix of `key`.
    pub fn find_shortest(&self, key: &[Symbol]) -> Option<RuleId> {
        let mut node = &self.root;
        if let Some(value) = node.value {
            return Some(value);
        }
        for symbol in key {
            node = node.children.get(symbol)?;
            if let Some(value) = node.value {
                return Some(value);
            }
        }
        None
    }
}
