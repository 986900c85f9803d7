//! Convenient re-exports for common usage.
//!
//! ```
//! use lww_element_set::prelude::*;
//! ```

pub use crate::clock::{Clock, HybridClock, HybridTimestamp, ManualClock, SystemClock};
pub use crate::{converge, Crdt};
pub use crate::GCounter;
pub use crate::{LWWElementSet, LwwSetState};
pub use crate::{Record, TimestampedRecordStore};
