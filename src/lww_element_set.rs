use std::fmt;

use tracing::{debug, trace};

use crate::clock::Clock;
use crate::{converge, Crdt, Result, TimestampedRecordStore};

/// The replicated state of an LWW-Element-Set: one add store, one remove
/// store.
///
/// This is what replicas exchange. It carries no replica identity and no
/// clock, so two states compare equal exactly when both stores match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "E: serde::Serialize, T: serde::Serialize",
        deserialize = "E: serde::Deserialize<'de>, T: serde::Deserialize<'de>"
    ))
)]
pub struct LwwSetState<E: Ord + Clone, T: Ord + Clone> {
    adds: TimestampedRecordStore<E, T>,
    removes: TimestampedRecordStore<E, T>,
}

impl<E: Ord + Clone, T: Ord + Clone> LwwSetState<E, T> {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adds: TimestampedRecordStore::new(),
            removes: TimestampedRecordStore::new(),
        }
    }

    /// Assemble a state from an add store and a remove store.
    #[must_use]
    pub fn from_stores(
        adds: TimestampedRecordStore<E, T>,
        removes: TimestampedRecordStore<E, T>,
    ) -> Self {
        Self { adds, removes }
    }

    /// The add store.
    #[must_use]
    pub fn adds(&self) -> &TimestampedRecordStore<E, T> {
        &self.adds
    }

    /// The remove store.
    #[must_use]
    pub fn removes(&self) -> &TimestampedRecordStore<E, T> {
        &self.removes
    }

    /// Check whether `element` is currently in the set.
    ///
    /// An element is present when it has an add record and either no remove
    /// record or a remove record strictly older than the add. Equal
    /// timestamps count as removed.
    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        match (self.adds.get(element), self.removes.get(element)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(added), Some(removed)) => added > removed,
        }
    }

    /// Iterate over the elements currently in the set, in ascending order.
    pub fn value(&self) -> impl Iterator<Item = &E> + '_ {
        self.adds
            .elements()
            .filter(move |element| self.contains(element))
    }
}

impl<E: Ord + Clone, T: Ord + Clone> Default for LwwSetState<E, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord + Clone, T: Ord + Clone> Crdt for LwwSetState<E, T> {
    fn merge(&mut self, other: &Self) {
        self.adds.merge(&other.adds);
        self.removes.merge(&other.removes);
    }
}

/// A last-writer-wins element set (LWW-Element-Set).
///
/// Every element keeps the latest time it was added and the latest time it
/// was removed, independently. Membership compares the two: the later one
/// wins, and on an exact tie the remove wins, so a stale add stamped at the
/// same instant as a remove cannot resurrect the element. Unlike a 2P-Set,
/// elements can be re-added after removal, and a remove may arrive before
/// the add it cancels.
///
/// Timestamps come from the injected [`Clock`]. The timestamp type is the
/// clock's, so a [`HybridClock`](crate::clock::HybridClock) gives
/// replica-qualified stamps that never tie across nodes.
///
/// Equality compares the replicated state only; the replica id and the clock
/// are ignored.
///
/// # Example
///
/// ```
/// use lww_element_set::prelude::*;
///
/// let clock = ManualClock::new(1u64);
/// let mut r1 = LWWElementSet::new("r1", &clock);
/// let mut r2 = LWWElementSet::new("r2", &clock);
///
/// r1.add("apple").unwrap();
/// clock.set(2);
/// r2.remove("apple").unwrap();
///
/// r1.sync(&mut r2);
/// assert_eq!(r1, r2);
/// assert!(!r1.contains(&"apple")); // the remove is newer
/// ```
pub struct LWWElementSet<E: Ord + Clone, C: Clock> {
    id: String,
    clock: C,
    state: LwwSetState<E, C::Timestamp>,
}

impl<E: Ord + Clone, C: Clock> LWWElementSet<E, C> {
    /// Create an empty set for the given replica, stamped by `clock`.
    pub fn new(id: impl Into<String>, clock: C) -> Self {
        Self::with_state(id, clock, LwwSetState::new())
    }

    /// Create a replica starting from an existing state, e.g. one restored
    /// from a peer.
    pub fn with_state(
        id: impl Into<String>,
        clock: C,
        state: LwwSetState<E, C::Timestamp>,
    ) -> Self {
        Self {
            id: id.into(),
            clock,
            state,
        }
    }

    /// Add an element, stamped with the clock's current time.
    ///
    /// Fails only if the clock cannot produce a timestamp, in which case the
    /// set is left unchanged.
    pub fn add(&mut self, element: E) -> Result<()> {
        let timestamp = self.stamp("add")?;
        self.add_at(element, timestamp);
        Ok(())
    }

    /// Remove an element, stamped with the clock's current time.
    ///
    /// The element does not need to have been added; the removal is recorded
    /// and cancels any add with an older or equal timestamp, including adds
    /// that arrive later through a merge.
    pub fn remove(&mut self, element: E) -> Result<()> {
        let timestamp = self.stamp("remove")?;
        self.remove_at(element, timestamp);
        Ok(())
    }

    /// Record an add at an explicit timestamp.
    pub fn add_at(&mut self, element: E, timestamp: C::Timestamp) {
        let changed = self.state.adds.upsert(element, timestamp);
        trace!(replica = %self.id, changed, "recorded add");
    }

    /// Record a remove at an explicit timestamp.
    pub fn remove_at(&mut self, element: E, timestamp: C::Timestamp) {
        let changed = self.state.removes.upsert(element, timestamp);
        trace!(replica = %self.id, changed, "recorded remove");
    }

    /// Check whether `element` is currently in the set.
    ///
    /// See [`LwwSetState::contains`] for the rule.
    #[must_use]
    pub fn contains(&self, element: &E) -> bool {
        self.state.contains(element)
    }

    /// Iterate over the elements currently in the set.
    ///
    /// Computed afresh on every call by walking the add store.
    pub fn value(&self) -> impl Iterator<Item = &E> + '_ {
        self.state.value()
    }

    /// Number of elements currently in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value().count()
    }

    /// Check if no element is currently in the set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value().next().is_none()
    }

    /// Merge two replicas so both end up with the same state.
    ///
    /// Does nothing if the states are already equal. Otherwise the joined
    /// state is computed once and assigned to `self` and `other`; afterwards
    /// `self == other`. Taking both replicas mutably keeps local writes from
    /// interleaving with the exchange. Returns `true` if either replica
    /// changed.
    pub fn sync(&mut self, other: &mut Self) -> bool {
        if !converge(&mut self.state, &mut other.state) {
            trace!(replica = %self.id, peer = %other.id, "already in sync");
            return false;
        }
        debug!(
            replica = %self.id,
            peer = %other.id,
            adds = self.state.adds.len(),
            removes = self.state.removes.len(),
            "synced replicas"
        );
        true
    }

    /// Join a state received from a peer into this replica.
    pub fn merge_state(&mut self, state: &LwwSetState<E, C::Timestamp>) {
        self.state.merge(state);
        debug!(replica = %self.id, "merged remote state");
    }

    /// This replica's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The clock stamping this replica's operations.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The replicated state, ready to ship to a peer.
    #[must_use]
    pub fn state(&self) -> &LwwSetState<E, C::Timestamp> {
        &self.state
    }

    /// The add store.
    #[must_use]
    pub fn adds(&self) -> &TimestampedRecordStore<E, C::Timestamp> {
        self.state.adds()
    }

    /// The remove store.
    #[must_use]
    pub fn removes(&self) -> &TimestampedRecordStore<E, C::Timestamp> {
        self.state.removes()
    }

    fn stamp(&self, op: &'static str) -> Result<C::Timestamp> {
        self.clock.now().map_err(|err| {
            debug!(replica = %self.id, op, error = %err, "clock unavailable");
            err
        })
    }
}

impl<E: Ord + Clone, C: Clock> Crdt for LWWElementSet<E, C> {
    fn merge(&mut self, other: &Self) {
        self.merge_state(&other.state);
    }
}

impl<E: Ord + Clone, C: Clock> PartialEq for LWWElementSet<E, C> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<E: Ord + Clone, C: Clock> Eq for LWWElementSet<E, C> {}

impl<E: Ord + Clone, C: Clock + Clone> Clone for LWWElementSet<E, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            clock: self.clock.clone(),
            state: self.state.clone(),
        }
    }
}

impl<E, C> fmt::Debug for LWWElementSet<E, C>
where
    E: Ord + Clone + fmt::Debug,
    C: Clock,
    C::Timestamp: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LWWElementSet")
            .field("id", &self.id)
            .field("adds", &self.state.adds)
            .field("removes", &self.state.removes)
            .finish()
    }
}

impl<E, C> fmt::Display for LWWElementSet<E, C>
where
    E: Ord + Clone + fmt::Debug,
    C: Clock,
    C::Timestamp: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LWW set {} has add store {:?} and remove store {:?}",
            self.id, self.state.adds, self.state.removes
        )
    }
}
