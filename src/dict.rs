//! Frequency analysis for the static string dictionary.
//!
//! A recursive walk counts every string occurrence (map keys included); the
//! worth-coding set is the strings whose score `(count - 1) * len` clears the
//! threshold, so a string must repeat and be long enough to pay for its table
//! slot.

use crate::value::Value;
use hashbrown::HashMap;

#[cfg(not(feature = "std"))]
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

/// Default score a string must exceed to be worth coding.
pub const SCORE_THRESHOLD: usize = 5;

/// Counts string occurrences across a value tree and selects a static
/// dictionary. One-shot: build, walk, then [`get_dict`](Self::get_dict).
#[derive(Debug)]
pub struct DictBuilder {
    count: HashMap<String, usize>,
    threshold: usize,
}

impl Default for DictBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DictBuilder {
    pub fn new() -> Self {
        DictBuilder {
            count: HashMap::new(),
            threshold: SCORE_THRESHOLD,
        }
    }

    /// Overrides the default worth-coding threshold.
    pub fn score_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Counts one string occurrence.
    pub fn add_str(&mut self, s: &str) {
        *self.count.entry_ref(s).or_insert(0) += 1;
    }

    /// Walks `value` recursively, counting string values and dictionary keys.
    pub fn add(&mut self, value: &Value) {
        match value {
            Value::Str(s) => self.add_str(s),
            Value::List(items) => {
                for item in items {
                    self.add(item);
                }
            }
            Value::Dict(map) => {
                for (key, val) in map {
                    self.add_str(key);
                    self.add(val);
                }
            }
            _ => {}
        }
    }

    /// Returns the worth-coding strings, highest score first, truncated to
    /// `size` entries. Ties break lexicographically so the output is stable.
    ///
    /// Strings containing NUL are excluded: the table preamble frames each
    /// entry with a `0x00` terminator and could not carry them.
    pub fn get_dict(&self, size: usize) -> Vec<String> {
        let mut scored: Vec<(&str, usize)> = self
            .count
            .iter()
            .filter_map(|(s, &count)| {
                if s.as_bytes().contains(&0) {
                    return None;
                }
                let score = count.saturating_sub(1) * s.len();
                (score > self.threshold).then_some((s.as_str(), score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored.truncate(size);
        scored.into_iter().map(|(s, _)| s.to_string()).collect()
    }
}
