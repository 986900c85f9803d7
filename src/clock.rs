//! Clock services that stamp set operations.
//!
//! A [`LWWElementSet`](crate::LWWElementSet) never reads the time itself; it
//! asks the [`Clock`] it was built with. Three clocks are provided:
//!
//! - [`SystemClock`]: wall-clock microseconds, forced monotonic per process.
//! - [`HybridClock`]: a Hybrid Logical Clock whose stamps carry a node id,
//!   so two replicas can never produce equal timestamps.
//! - [`ManualClock`]: hand-driven, for tests and simulations.
//!
//! All clocks take `&self` and are `Sync`, so one clock may stamp several
//! replicas (through `&C` or `Arc<C>`).
//!
//! # Example
//!
//! ```
//! use lww_element_set::clock::{Clock, HybridClock, HybridTimestamp};
//!
//! let clock = HybridClock::new(1); // node_id = 1
//!
//! let ts1 = clock.now().unwrap();
//! let ts2 = clock.now().unwrap();
//! assert!(ts2 > ts1);
//!
//! // Receive a timestamp from a remote node
//! let remote_ts = HybridTimestamp { physical: ts2.physical + 1000, logical: 0, node_id: 2 };
//! let ts3 = clock.receive(&remote_ts).unwrap();
//! assert!(ts3 > remote_ts);
//! ```

use std::cmp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// A source of timestamps for local operations.
///
/// Successive calls on one clock must never return a smaller timestamp.
/// A clock that cannot read the time returns [`Error::ClockUnavailable`]
/// rather than inventing a value.
pub trait Clock {
    /// The totally ordered timestamp this clock produces.
    type Timestamp: Ord + Clone;

    /// Read the current time.
    fn now(&self) -> Result<Self::Timestamp>;
}

impl<C: Clock + ?Sized> Clock for &C {
    type Timestamp = C::Timestamp;

    fn now(&self) -> Result<Self::Timestamp> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    type Timestamp = C::Timestamp;

    fn now(&self) -> Result<Self::Timestamp> {
        (**self).now()
    }
}

fn system_time_micros() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .map_err(|err| Error::ClockUnavailable(err.to_string()))
}

/// Wall-clock time in microseconds since the Unix epoch.
///
/// Readings are clamped to never go below the last one handed out, so a
/// system clock stepping backwards yields repeated values instead of
/// regressing. Equal readings are possible; the set breaks such ties in
/// favour of removal.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    /// Create a new system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    type Timestamp = u64;

    fn now(&self) -> Result<u64> {
        let now = system_time_micros()?;
        let prev = self.last.fetch_max(now, Ordering::SeqCst);
        Ok(cmp::max(prev, now))
    }
}

/// A timestamp from a Hybrid Logical Clock.
///
/// Consists of:
/// - `physical`: milliseconds since Unix epoch (or any monotonic source)
/// - `logical`: counter for events within the same physical millisecond
/// - `node_id`: tiebreaker to ensure total ordering across nodes
///
/// Ordered by `physical`, then `logical`, then `node_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HybridTimestamp {
    /// Physical time component (milliseconds).
    pub physical: u64,
    /// Logical counter for same-millisecond ordering.
    pub logical: u16,
    /// Node identifier for deterministic tiebreaking.
    pub node_id: u16,
}

impl HybridTimestamp {
    /// Create a zero timestamp.
    pub fn zero() -> Self {
        Self {
            physical: 0,
            logical: 0,
            node_id: 0,
        }
    }
}

impl Ord for HybridTimestamp {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.physical
            .cmp(&other.physical)
            .then(self.logical.cmp(&other.logical))
            .then(self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for HybridTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

fn system_time_ms() -> Result<u64> {
    system_time_micros().map(|micros| micros / 1000)
}

/// A Hybrid Logical Clock instance for a single node.
///
/// Call [`now`](Clock::now) to generate timestamps for local events.
/// Call [`receive`](HybridClock::receive) when processing a remote timestamp.
#[derive(Debug)]
pub struct HybridClock {
    node_id: u16,
    last: Mutex<HybridTimestamp>,
    physical_time_fn: fn() -> Result<u64>,
}

impl HybridClock {
    /// Create a new clock for the given node, driven by the system time.
    pub fn new(node_id: u16) -> Self {
        Self::with_time_source(node_id, system_time_ms)
    }

    /// Create a clock with a custom physical time source.
    /// The function should return milliseconds (monotonic if possible).
    pub fn with_time_source(node_id: u16, time_fn: fn() -> Result<u64>) -> Self {
        Self {
            node_id,
            last: Mutex::new(HybridTimestamp::zero()),
            physical_time_fn: time_fn,
        }
    }

    /// Update the clock upon receiving a remote timestamp.
    ///
    /// Returns a new timestamp that is strictly greater than both
    /// the local clock and the received timestamp.
    pub fn receive(&self, remote: &HybridTimestamp) -> Result<HybridTimestamp> {
        let pt = (self.physical_time_fn)()?;
        let mut last = self.lock()?;
        let max_pt = cmp::max(cmp::max(pt, last.physical), remote.physical);

        let next = if max_pt == last.physical && max_pt == remote.physical {
            self.tick(max_pt, cmp::max(last.logical, remote.logical))?
        } else if max_pt == last.physical {
            self.tick(max_pt, last.logical)?
        } else if max_pt == remote.physical {
            self.tick(max_pt, remote.logical)?
        } else {
            self.stamp(max_pt, 0)
        };
        *last = next;

        Ok(next)
    }

    /// Get the node ID of this clock.
    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    /// Get the last generated timestamp.
    pub fn last_timestamp(&self) -> Result<HybridTimestamp> {
        self.lock().map(|last| *last)
    }

    fn stamp(&self, physical: u64, logical: u16) -> HybridTimestamp {
        HybridTimestamp {
            physical,
            logical,
            node_id: self.node_id,
        }
    }

    /// The stamp right after `(physical, logical)`. A full logical counter
    /// rolls over into the next physical millisecond.
    fn tick(&self, physical: u64, logical: u16) -> Result<HybridTimestamp> {
        match logical.checked_add(1) {
            Some(logical) => Ok(self.stamp(physical, logical)),
            None => physical
                .checked_add(1)
                .map(|physical| self.stamp(physical, 0))
                .ok_or_else(|| Error::ClockUnavailable("hybrid clock exhausted".to_string())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HybridTimestamp>> {
        self.last
            .lock()
            .map_err(|_| Error::ClockUnavailable("hybrid clock state poisoned".to_string()))
    }
}

impl Clock for HybridClock {
    type Timestamp = HybridTimestamp;

    /// Generate a timestamp for a local event.
    ///
    /// Guarantees monotonically increasing timestamps even if the
    /// physical clock goes backward.
    fn now(&self) -> Result<HybridTimestamp> {
        let pt = (self.physical_time_fn)()?;
        let mut last = self.lock()?;

        let next = if pt > last.physical {
            self.stamp(pt, 0)
        } else {
            self.tick(last.physical, last.logical)?
        };
        *last = next;

        Ok(next)
    }
}

/// A clock that reports whatever it was last told.
///
/// Holding the reading constant produces equal timestamps on purpose, which
/// is how tie-break behaviour is exercised. Keeping it monotonic is up to the
/// caller.
///
/// # Example
///
/// ```
/// use lww_element_set::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new(10u64);
/// assert_eq!(clock.now().unwrap(), 10);
///
/// clock.set(20);
/// assert_eq!(clock.now().unwrap(), 20);
///
/// clock.stop();
/// assert!(clock.now().is_err());
/// ```
#[derive(Debug)]
pub struct ManualClock<T> {
    reading: Mutex<Option<T>>,
}

impl<T: Ord + Clone> ManualClock<T> {
    /// Create a clock reading `start`.
    pub fn new(start: T) -> Self {
        Self {
            reading: Mutex::new(Some(start)),
        }
    }

    /// Replace the current reading. Also restarts a stopped clock.
    pub fn set(&self, timestamp: T) {
        let mut reading = self
            .reading
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *reading = Some(timestamp);
    }

    /// Make the clock unavailable until the next [`set`](Self::set).
    pub fn stop(&self) {
        let mut reading = self
            .reading
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *reading = None;
    }
}

impl<T: Clone> Clone for ManualClock<T> {
    fn clone(&self) -> Self {
        let reading = self
            .reading
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self {
            reading: Mutex::new(reading),
        }
    }
}

impl<T: Ord + Clone> Clock for ManualClock<T> {
    type Timestamp = T;

    fn now(&self) -> Result<T> {
        let reading = self
            .reading
            .lock()
            .map_err(|_| Error::ClockUnavailable("manual clock state poisoned".to_string()))?;
        reading
            .clone()
            .ok_or_else(|| Error::ClockUnavailable("manual clock stopped".to_string()))
    }
}
