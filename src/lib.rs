//! # lww-element-set
//!
//! A last-writer-wins element set (LWW-Element-Set) CRDT.
//!
//! A CRDT (Conflict-free Replicated Data Type) is a data structure that can be
//! replicated across multiple devices and updated independently. When replicas
//! are merged, they are guaranteed to converge to the same state without
//! requiring coordination or consensus.
//!
//! The LWW-Element-Set keeps, for every element, the latest time it was added
//! and the latest time it was removed. An element is in the set when its add
//! is strictly newer than its remove; on a tie the remove wins.
//!
//! ## Quick Start
//!
//! ```
//! use lww_element_set::prelude::*;
//!
//! let clock = ManualClock::new(100u64);
//! let mut r1 = LWWElementSet::new("replica-1", &clock);
//! r1.add("apple").unwrap();
//!
//! let mut r2 = LWWElementSet::new("replica-2", &clock);
//! r2.add_at("apple", 50);
//! r2.remove_at("apple", 80);
//!
//! r1.sync(&mut r2);
//! assert_eq!(r1, r2);
//! assert!(r2.contains(&"apple")); // the add at 100 postdates the remove at 80
//! ```
//!
//! ## Contents
//!
//! - [`LWWElementSet`] - the replicated set, stamped by an injected [`Clock`]
//! - [`TimestampedRecordStore`] - latest timestamp per element, one per side
//! - [`LwwSetState`] - the add/remove store pair replicas exchange
//! - [`GCounter`] - grow-only counter with per-node counts
//! - [`clock`] - [`SystemClock`], [`HybridClock`] and [`ManualClock`]
//!
//! ## The `Crdt` Trait
//!
//! All types implement the [`Crdt`] trait, which provides the [`Crdt::merge`]
//! method. Merge is guaranteed to be commutative, associative, and idempotent.
//! [`converge`] runs the join once and hands it to both replicas.
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for the replicated state. Incoming
//!   stores naming an element twice are rejected. Off by default; the test
//!   suite always builds with it.

#![warn(missing_docs)]

mod crdt;
mod error;
mod gcounter;
mod lww_element_set;
mod record_store;

pub mod clock;
pub mod prelude;

pub use clock::{Clock, HybridClock, HybridTimestamp, ManualClock, SystemClock};
pub use crdt::{converge, Crdt};
pub use error::{Error, Result};
pub use gcounter::GCounter;
pub use lww_element_set::{LWWElementSet, LwwSetState};
pub use record_store::{Record, TimestampedRecordStore};
