use std::collections::VecDeque;

use crate::domain::entities::Entry;
use crate::domain::value_objects::SnapshotId;

/// Ordered queue of entries for one assembly run.
///
/// Entries leave the stripe front to back, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stripe {
    entries: VecDeque<Entry>,
}

impl Stripe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the next entry in stripe order
    pub fn take_next(&mut self) -> Option<Entry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots referenced by the remaining entries, in stripe order (may repeat)
    pub fn snapshots(&self) -> impl Iterator<Item = &SnapshotId> {
        self.entries.iter().map(Entry::snapshot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

impl From<Vec<Entry>> for Stripe {
    fn from(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into(),
        }
    }
}

impl FromIterator<Entry> for Stripe {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
