/// Core trait that all CRDTs in this crate implement.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas will converge to the same state after merging,
/// without requiring coordination.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
pub trait Crdt {
    /// Merge another replica's state into this one.
    ///
    /// After merging, `self` contains the least upper bound of both states.
    /// `other` is left untouched.
    fn merge(&mut self, other: &Self);
}

/// Join two replica states and hand the result to both of them.
///
/// The join is computed once from the two inputs, then assigned to each
/// side. Afterwards `a == b`. Does nothing when the states are already
/// equal. Returns `true` if either side changed. Meant for plain state
/// values; types that also carry a replica identity expose their own `sync`
/// built on this.
///
/// # Example
///
/// ```
/// use lww_element_set::prelude::*;
///
/// let mut a = TimestampedRecordStore::new();
/// a.upsert("x", 1);
/// let mut b = TimestampedRecordStore::new();
/// b.upsert("y", 2);
///
/// assert!(converge(&mut a, &mut b));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 2);
/// assert!(!converge(&mut a, &mut b));
/// ```
pub fn converge<C>(a: &mut C, b: &mut C) -> bool
where
    C: Crdt + Clone + PartialEq,
{
    if a == b {
        return false;
    }
    let mut joined = a.clone();
    joined.merge(b);
    b.clone_from(&joined);
    *a = joined;
    true
}
