use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::Crdt;

/// A grow-only counter (G-Counter).
///
/// Tracks one count per node. The counter's value is the sum of all node
/// counts, and merging keeps the larger count for each node. Counts only
/// ever grow, so there is no removal to reconcile.
///
/// # Example
///
/// ```
/// use lww_element_set::prelude::*;
///
/// let mut c1 = GCounter::new("replica-1");
/// c1.increment("node-a");
/// c1.increment("node-a");
///
/// let mut c2 = GCounter::new("replica-2");
/// c2.increment("node-b");
///
/// c1.sync(&mut c2);
/// assert_eq!(c1.value(), 3);
/// assert_eq!(c2.value(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GCounter {
    id: String,
    counts: BTreeMap<String, u64>,
}

impl GCounter {
    /// Create a new G-Counter for the given replica ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            counts: BTreeMap::new(),
        }
    }

    /// Start tracking `node` at zero. Existing counts are left alone.
    pub fn add_node(&mut self, node: impl Into<String>) {
        self.counts.entry(node.into()).or_insert(0);
    }

    /// Increment `node`'s count by 1, tracking it first if needed.
    pub fn increment(&mut self, node: impl Into<String>) {
        self.increment_by(node, 1);
    }

    /// Increment `node`'s count by `n`, tracking it first if needed.
    pub fn increment_by(&mut self, node: impl Into<String>, n: u64) {
        let count = self.counts.entry(node.into()).or_insert(0);
        *count = count.saturating_add(n);
    }

    /// Get the total counter value across all nodes.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get this replica's ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the count for a specific node.
    #[must_use]
    pub fn count_for(&self, node: &str) -> u64 {
        self.counts.get(node).copied().unwrap_or(0)
    }

    /// Iterate over tracked nodes and their counts.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(node, &count)| (node.as_str(), count))
    }

    /// Merge two replicas so both end up with the same counts.
    pub fn sync(&mut self, other: &mut Self) {
        if self.counts == other.counts {
            return;
        }
        self.merge(other);
        other.counts.clone_from(&self.counts);
        debug!(replica = %self.id, peer = %other.id, value = self.value(), "synced counters");
    }
}

impl Crdt for GCounter {
    fn merge(&mut self, other: &Self) {
        for (node, &count) in &other.counts {
            let entry = self.counts.entry(node.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
    }
}

impl fmt::Display for GCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "g counter {} = {:?}, sum = {}",
            self.id,
            self.counts,
            self.value()
        )
    }
}
