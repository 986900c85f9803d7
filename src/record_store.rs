use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use crate::{Crdt, Error, Result};

/// A single `(element, timestamp)` pair as it travels between replicas.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record<E, T> {
    /// The element this record is about.
    pub element: E,
    /// When the element was last stamped.
    pub timestamp: T,
}

/// Latest timestamp per element, for one side (add or remove) of a set.
///
/// Holds at most one timestamp per element. Writes never regress an entry:
/// a timestamp only replaces the stored one when it is strictly newer, so
/// records may be applied in any order.
///
/// With the `serde` feature the store is (de)serialized as a list of
/// [`Record`]s, and a list naming the same element twice is rejected.
///
/// # Example
///
/// ```
/// use lww_element_set::prelude::*;
///
/// let mut store = TimestampedRecordStore::new();
/// store.upsert("apple", 10);
/// store.upsert("apple", 5); // older, ignored
///
/// assert_eq!(store.get(&"apple"), Some(&10));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        try_from = "Vec<Record<E, T>>",
        into = "Vec<Record<E, T>>",
        bound(
            serialize = "E: serde::Serialize, T: serde::Serialize",
            deserialize = "E: serde::Deserialize<'de>, T: serde::Deserialize<'de>"
        )
    )
)]
pub struct TimestampedRecordStore<E: Ord + Clone, T: Ord + Clone> {
    records: BTreeMap<E, T>,
}

impl<E: Ord + Clone, T: Ord + Clone> TimestampedRecordStore<E, T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Build a store from foreign records.
    ///
    /// Fails with [`Error::InvalidElement`] if two records name the same
    /// element; a well-formed store never carries more than one.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Record<E, T>>,
    {
        let mut store = Self::new();
        for Record { element, timestamp } in records {
            match store.records.entry(element) {
                btree_map::Entry::Occupied(_) => {
                    return Err(Error::InvalidElement(
                        "element recorded more than once".to_string(),
                    ));
                }
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(timestamp);
                }
            }
        }
        Ok(store)
    }

    /// Record `element` at `timestamp`.
    ///
    /// Inserts if the element is new, otherwise replaces the stored
    /// timestamp only when `timestamp` is strictly newer. Returns `true` if
    /// the store changed.
    pub fn upsert(&mut self, element: E, timestamp: T) -> bool {
        match self.records.entry(element) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(timestamp);
                true
            }
            btree_map::Entry::Occupied(mut entry) => {
                if timestamp > *entry.get() {
                    entry.insert(timestamp);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Get the timestamp recorded for `element`.
    #[must_use]
    pub fn get(&self, element: &E) -> Option<&T> {
        self.records.get(element)
    }

    /// Check whether `element` has a record.
    #[must_use]
    pub fn contains_key(&self, element: &E) -> bool {
        self.records.contains_key(element)
    }

    /// Number of elements with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(element, timestamp)` pairs in ascending element order.
    pub fn iter(&self) -> impl Iterator<Item = (&E, &T)> {
        self.records.iter()
    }

    /// Iterate over the stored elements in ascending order.
    pub fn elements(&self) -> impl Iterator<Item = &E> {
        self.records.keys()
    }

    /// Copy the store out as a list of records.
    #[must_use]
    pub fn records(&self) -> Vec<Record<E, T>> {
        self.records
            .iter()
            .map(|(element, timestamp)| Record {
                element: element.clone(),
                timestamp: timestamp.clone(),
            })
            .collect()
    }

    /// Join two stores without touching either.
    ///
    /// The result holds every element present in either input, each with
    /// the larger of its two timestamps.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        joined.merge(other);
        joined
    }
}

impl<E: Ord + Clone, T: Ord + Clone> Default for TimestampedRecordStore<E, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord + Clone, T: Ord + Clone> Crdt for TimestampedRecordStore<E, T> {
    fn merge(&mut self, other: &Self) {
        for (element, timestamp) in &other.records {
            self.upsert(element.clone(), timestamp.clone());
        }
    }
}

impl<E, T> fmt::Debug for TimestampedRecordStore<E, T>
where
    E: Ord + Clone + fmt::Debug,
    T: Ord + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.records.iter()).finish()
    }
}

impl<E: Ord + Clone, T: Ord + Clone> From<TimestampedRecordStore<E, T>> for Vec<Record<E, T>> {
    fn from(store: TimestampedRecordStore<E, T>) -> Self {
        store
            .records
            .into_iter()
            .map(|(element, timestamp)| Record { element, timestamp })
            .collect()
    }
}

impl<E: Ord + Clone, T: Ord + Clone> TryFrom<Vec<Record<E, T>>>
    for TimestampedRecordStore<E, T>
{
    type Error = Error;

    fn try_from(records: Vec<Record<E, T>>) -> Result<Self> {
        Self::from_records(records)
    }
}
