use std::collections::VecDeque;

use crate::attributes::AttributeSet;

/// FINST list: the most recently attended stimuli, oldest first.
///
/// Capacity is the configured FINST count. A capacity of zero disables
/// attention tracking altogether; matchers skip the attended filter for a
/// disabled history exactly as if none were supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttentionHistory {
    capacity: usize,
    entries: VecDeque<AttributeSet>,
}

impl AttentionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Record an attended stimulus. Re-attending moves it to the most
    /// recent end; at capacity the oldest entry is evicted.
    pub fn record(&mut self, attributes: AttributeSet) {
        if !self.is_enabled() {
            return;
        }
        if let Some(idx) = self.entries.iter().position(|e| *e == attributes) {
            self.entries.remove(idx);
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(attributes);
    }

    pub fn contains(&self, attributes: &AttributeSet) -> bool {
        self.entries.contains(attributes)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeSet> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
