//! Duplicate-suppression filter for at-least-once inbound delivery.
//!
//! Each sender session owns one [`RecentMessageIds`]. When more than
//! `capacity` IDs are recorded the set is compacted to the `retain` most
//! recently inserted ones. A false negative after compaction only risks a
//! repeated prompt: publication needs an explicit finish keyword at the photo
//! step and a moderator decision.

use std::collections::{HashSet, VecDeque};

/// Bounded, insertion-ordered set of processed inbound message IDs.
#[derive(Debug, Clone)]
pub struct RecentMessageIds {
    capacity: usize,
    retain: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentMessageIds {
    /// Empty set compacting to `retain` entries once `capacity` is exceeded.
    #[must_use]
    pub fn new(capacity: usize, retain: usize) -> Self {
        Self {
            capacity,
            retain: retain.min(capacity),
            order: VecDeque::with_capacity(capacity + 1),
            seen: HashSet::with_capacity(capacity + 1),
        }
    }

    /// Record `message_id` and report whether it is new.
    ///
    /// Events without an identifier bypass the filter and are always new.
    pub fn record(&mut self, message_id: Option<&str>) -> bool {
        let Some(id) = message_id else {
            return true;
        };
        if self.seen.contains(id) {
            return false;
        }

        self.seen.insert(id.to_owned());
        self.order.push_back(id.to_owned());

        if self.order.len() > self.capacity {
            while self.order.len() > self.retain {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
        true
    }

    /// Whether `message_id` is currently remembered.
    #[must_use]
    pub fn contains(&self, message_id: &str) -> bool {
        self.seen.contains(message_id)
    }

    /// Number of remembered IDs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no ID is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(capacity, retain)` this set was built with.
    #[must_use]
    pub fn limits(&self) -> (usize, usize) {
        (self.capacity, self.retain)
    }
}
