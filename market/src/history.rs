use std::collections::VecDeque;

use crate::types::Sample;

/// Extra slots kept beyond the longest look-back so off-by-one reads still land.
pub const HISTORY_MARGIN: usize = 2;

/// Bounded, oldest-first ring buffer of price samples.
///
/// Appending to a full buffer evicts the oldest sample, so `len() <= capacity()`
/// holds after every operation.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Capacity for a look-back of `max_steps`, plus the safety margin.
    pub fn for_lookback(max_steps: usize) -> Self {
        Self::with_capacity(max_steps + HISTORY_MARGIN)
    }

    pub fn append(&mut self, sample: Sample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Sample `steps_back` positions before the most recent one (0 = most recent).
    ///
    /// `None` while the buffer holds `steps_back` samples or fewer.
    pub fn lookback(&self, steps_back: usize) -> Option<&Sample> {
        let len = self.samples.len();
        if len <= steps_back {
            return None;
        }
        self.samples.get(len - 1 - steps_back)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The most recent `count` samples, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Sample> {
        let skip = self.samples.len().saturating_sub(count);
        self.samples.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Resize the buffer. Shrinking evicts the oldest samples first.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
