//! Error types for set and clock operations.

use thiserror::Error;

/// Errors surfaced by this crate.
///
/// Nothing inside a merge or a membership query can fail; errors only arise
/// at the boundaries: obtaining a timestamp and accepting foreign state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An element or record was rejected before reaching a store.
    #[error("invalid element: {0}")]
    InvalidElement(String),

    /// The clock service could not produce a timestamp.
    #[error("clock unavailable: {0}")]
    ClockUnavailable(String),
}

/// Result alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
