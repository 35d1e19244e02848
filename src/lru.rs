//! Bounded window of recently written strings.
//!
//! Despite the name this is not reordered on access: it is a FIFO ring of
//! insertions (plus explicit removes) that both sides of the codec mutate in
//! lockstep, so an index from the tail means the same string to writer and
//! reader.

use crate::io::{Error, Result};

#[cfg(not(feature = "std"))]
use alloc::{collections::VecDeque, string::String};
#[cfg(feature = "std")]
use std::collections::VecDeque;

/// Window capacity used by the codec on both sides.
pub const WINDOW_CAP: usize = 512;

/// A capacity-bounded ordered window of strings. Appending past the capacity
/// drops the oldest entries from the front.
#[derive(Debug, Clone)]
pub struct LruWindow {
    cap: usize,
    deque: VecDeque<String>,
}

impl LruWindow {
    pub fn new(cap: usize) -> Self {
        LruWindow {
            cap,
            deque: VecDeque::with_capacity(cap),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    /// Appends at the back, evicting from the front until one slot is free.
    pub fn append(&mut self, val: String) {
        while self.deque.len() + 1 > self.cap {
            if self.deque.pop_front().is_none() {
                break;
            }
        }
        self.deque.push_back(val);
    }

    /// Appends each string in order.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for val in iter {
            self.append(val);
        }
    }

    /// Removes the first occurrence of `val`, preserving the order of the
    /// rest. The value being absent is a caller bug, not an input fault.
    pub fn remove(&mut self, val: &str) -> Result<()> {
        match self.find_index(val) {
            Some(idx) => {
                self.deque.remove(idx);
                Ok(())
            }
            None => Err(Error::InvariantViolation(
                "remove of a string absent from the window",
            )),
        }
    }

    /// Zero-based index of `val` from the front, by linear scan.
    pub fn find_index(&self, val: &str) -> Option<usize> {
        self.deque.iter().position(|s| s == val)
    }

    pub fn contains(&self, val: &str) -> bool {
        self.find_index(val).is_some()
    }

    /// Indexes the window. `idx <= 0` addresses from the tail: `0` is the
    /// most recently appended entry, `-1` the one before it. Positive `idx`
    /// addresses from the front.
    pub fn get(&self, idx: isize) -> Option<&str> {
        let i = if idx <= 0 {
            self.deque.len().checked_sub(1)?.checked_add_signed(idx)?
        } else {
            idx as usize
        };
        self.deque.get(i).map(String::as_str)
    }
}
