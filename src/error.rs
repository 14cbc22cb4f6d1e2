//! # Error Taxonomy
//!
//! Purpose: One crate-wide error enum so callers have a single place to
//! classify failures, in particular to separate "key absent" from real
//! faults via [`Error::is_not_found`].

use thiserror::Error;

/// Result type for all client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the namespaced client.
#[derive(Error, Debug)]
pub enum Error {
    /// Dialing the store or the construction/borrow liveness probe failed.
    /// Fatal to the triggering call, not to the process.
    #[error("store unreachable: {0}")]
    Connectivity(String),

    /// Operation attempted after the pool was shut down.
    #[error("connection pool is closed")]
    PoolClosed,

    /// The pool is at `max_active` capacity with no idle connection free.
    /// Borrowing never blocks; saturation fails fast with this error.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The key does not exist in the store. Not a true failure: the object
    /// layer suppresses it and callers should classify rather than abort.
    #[error("key not found")]
    NotFound,

    /// Error reply returned by the store, propagated verbatim.
    #[error("store error: {0}")]
    Store(String),

    /// Reply type did not match what the command expects.
    #[error("unexpected reply type")]
    UnexpectedReply,

    /// RESP framing violation on the wire.
    #[error("protocol error")]
    Protocol,

    /// Network or IO failure while reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Address could not be parsed into a socket address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Value could not be encoded for storage. Returned before any
    /// network round trip is attempted.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored blob could not be decoded into the requested type.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Returns true when the error is the store's "key does not exist"
    /// sentinel. This is the single decision point separating an absent
    /// value from failures that must be propagated.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_not_found() {
        assert!(Error::NotFound.is_not_found());
        assert!(!Error::PoolClosed.is_not_found());
        assert!(!Error::Store("ERR wrong type".into()).is_not_found());
    }
}
